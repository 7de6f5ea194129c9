//! Reactive Context
//!
//! The facade application code talks to. It owns a [`Graph`], creates
//! reactive value handles and opens builders:
//!
//! ```rust,ignore
//! let rc = ReactiveContext::new();
//! let a = rc.rv::<i32>("a");
//! let b = rc.rv::<i32>("b");
//! let c = rc.rv::<Vec<i32>>("c");
//!
//! rc.merge([rc.from(&a), rc.from(&b)]).into(&c);
//! a.set(3);
//! b.set(7);
//! assert_eq!(c.get(), vec![3, 7]);
//! ```

use std::rc::Rc;

use super::builder::{merge_inputs, Builder, JoinBuilders};
use super::context::{Context, Unbound};
use super::rv::Rv;
use crate::config::{DebuggerMode, EngineConfig};
use crate::debug::{Debugger, RemoteDebugger, TracingDebugger};
use crate::error::Result;
use crate::graph::{Edge, Graph, Inputs, Outputs, Value};

/// Entry point for building pipelines.
#[derive(Debug, Clone, Default)]
pub struct ReactiveContext {
    graph: Graph,
}

impl ReactiveContext {
    /// A context over a new graph with no debugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context over a new graph reporting to `debugger`.
    pub fn with_debugger(debugger: Rc<dyn Debugger>) -> Self {
        Self {
            graph: Graph::with_debugger(debugger),
        }
    }

    /// A context over a new graph with the debugger selected by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let context = match config.debugger.mode {
            DebuggerMode::Off => Self::new(),
            DebuggerMode::Tracing => Self::with_debugger(Rc::new(TracingDebugger)),
            DebuggerMode::Remote => {
                Self::with_debugger(Rc::new(RemoteDebugger::connect(&config.debugger)?))
            }
        };
        tracing::debug!(mode = ?config.debugger.mode, "reactive context created");
        Ok(context)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// A named handle to a fresh node holding `T::default()`.
    pub fn rv<T: Value>(&self, name: impl Into<String>) -> Rv<T> {
        Rv::new(&self.graph, name)
    }

    /// A named handle to a fresh node holding `value`.
    pub fn rv_with<T: Value>(&self, name: impl Into<String>, value: T) -> Rv<T> {
        Rv::with_value(&self.graph, name, value)
    }

    /// Start a pipeline at `rv`.
    pub fn from<T: Value>(&self, rv: &Rv<T>) -> Builder<T, Unbound> {
        Builder::new(Context::new(&self.graph).with_source(Inputs::Single(Rc::clone(rv.node()))))
    }

    /// A destination-only builder, used as a [`split`](Builder::split) argument.
    ///
    /// This is the standalone form of [`Builder::into`].
    pub fn destination<T: Value>(&self, rv: &Rv<T>) -> Builder<Unbound, T> {
        Builder::new(
            Context::new(&self.graph).with_destination(Outputs::Single(Rc::clone(rv.node()))),
        )
    }

    /// An edge-only builder applying `f`.
    pub fn map<I, O, F>(&self, f: F) -> Builder<I, O>
    where
        I: Value,
        O: Value,
        F: Fn(I) -> O + 'static,
    {
        Builder::new(Context::<I, Unbound>::new(&self.graph).with_edge(Edge::map(f)))
    }

    /// A builder flattening the nested sequence held by `rv`.
    pub fn flatten<T: Value>(&self, rv: &Rv<Vec<Vec<T>>>) -> Builder<Vec<Vec<T>>, Vec<T>> {
        self.from(rv).flatten()
    }

    /// Gather same-typed sources into a `Vec`, in argument order.
    ///
    /// Every argument must be a source-only builder (`from` or
    /// `hidden_node`); otherwise the result has no source and never applies.
    pub fn merge<T, B>(&self, sources: B) -> Builder<Vec<T>, Vec<T>>
    where
        T: Value,
        B: IntoIterator<Item = Builder<T, Unbound>>,
    {
        let mut context = Context::<Vec<T>, Unbound>::new(&self.graph);
        match merge_inputs(sources) {
            Some(inputs) => context = context.with_source(Inputs::Multi(inputs)),
            None => tracing::warn!("merge needs at least one source-only builder per argument"),
        }
        Builder::new(context.with_edge(Edge::merge()))
    }

    /// Gather differently typed sources into a tuple, in argument order.
    pub fn join<J: JoinBuilders>(&self, sources: J) -> Builder<J::Output, J::Output> {
        let mut context = Context::<J::Output, Unbound>::new(&self.graph);
        match sources.into_inputs() {
            Some(inputs) => context = context.with_source(Inputs::Multi(inputs)),
            None => tracing::warn!("join needs a source-only builder per argument"),
        }
        Builder::new(context.with_edge(Edge::join()))
    }
}
