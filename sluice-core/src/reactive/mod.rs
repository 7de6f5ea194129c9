//! Reactive Pipelines
//!
//! This module is the construction interface of the engine: reactive value
//! handles and the fluent builder that wires them together.
//!
//! # Concepts
//!
//! ## Reactive values
//!
//! An [`Rv`] names one node. Reading it returns the current value; writing it
//! pushes the value through every pipeline that starts at it.
//!
//! ## Contexts and builders
//!
//! A [`Context`] records which slots of a pipeline (source, edge,
//! destination) are bound. A [`Builder`] wraps a context and exposes the
//! chainable operations:
//!
//! - `from`, `into`, `to`: bind source and destination handles
//! - `map`, `merge`, `join`, `flatten`, `split`: bind the edge
//! - `hidden_node`: continue from an unnamed intermediate node
//!
//! The builder applies the pipeline to the graph as soon as all three slots
//! are bound.
//!
//! # Example
//!
//! ```rust,ignore
//! let rc = ReactiveContext::new();
//! let a = rc.rv::<i32>("a");
//! let b = rc.rv::<String>("b");
//!
//! rc.from(&a)
//!     .map(|n| n * 2)
//!     .hidden_node()
//!     .map(|n| format!("{n}"))
//!     .into(&b);
//!
//! a.set(21);
//! assert_eq!(b.get(), "42");
//! ```

mod builder;
mod context;
mod runtime;
mod rv;

pub use builder::{Builder, JoinBuilders};
pub use context::{Context, ContextState, SlotKind, Unbound};
pub use runtime::ReactiveContext;
pub use rv::Rv;
