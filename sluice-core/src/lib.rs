//! Sluice Core
//!
//! This crate provides a small push-based dataflow engine. It implements:
//!
//! - Named reactive values that hold the current value of a graph node
//! - Typed edges: map, merge, join, split and flatten
//! - A fluent builder that wires values together and applies each pipeline
//!   as soon as it is complete
//! - Debugger hooks, with recording, `tracing` and WebSocket backends
//!
//! Writes propagate synchronously: when `set` returns, every downstream node
//! holds its recomputed value.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: nodes, edges, connections and the propagation walk
//! - `reactive`: reactive value handles and the pipeline builder
//! - `debug`: the debugger collaborator and its implementations
//! - `config`: engine settings loaded from JSON or the environment
//!
//! # Example
//!
//! ```rust,ignore
//! use sluice_core::ReactiveContext;
//!
//! let rc = ReactiveContext::new();
//! let a = rc.rv::<i32>("a");
//! let b = rc.rv::<f32>("b");
//!
//! rc.from(&a).map(|n| n as f32 * 0.5).into(&b);
//!
//! a.set(5);
//! assert_eq!(b.get(), 2.5);
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::{DebuggerConfig, DebuggerMode, EngineConfig, WireEncoding};
pub use debug::{Debugger, RecordingDebugger, RemoteDebugger, TracingDebugger};
pub use error::{Error, Result};
pub use graph::{Edge, EdgeKind, Graph, Node, NodeId, Value};
pub use reactive::{Builder, Context, ContextState, ReactiveContext, Rv, Unbound};
