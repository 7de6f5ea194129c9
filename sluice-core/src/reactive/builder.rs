//! Pipeline Builder
//!
//! The builder is the fluent face of a [`Context`]. Each call consumes the
//! builder and returns a new one with one more slot bound:
//!
//! ```text
//!            from            map / merge / join / flatten
//! Empty ──────────► SourceOnly ──────────────► SourceAndEdge ──into──► Complete
//!   │                                               │                 (applied)
//!   │ map / merge / join / flatten                  │ hidden_node
//!   ▼                                               ▼
//! EdgeOnly ──into──► EdgeAndDestination       SourceOnly (hidden node as source)
//!                         │ from
//!                         ▼
//!                      Complete (applied)
//! ```
//!
//! As soon as a context becomes complete it is applied to the graph. The
//! returned builder keeps its source and a fresh copy of its edge, so a second
//! `into` fans the same transformation out to another destination.

use std::fmt;
use std::rc::Rc;

use super::context::{Context, ContextState, Unbound};
use super::rv::Rv;
use crate::error::{Error, Result};
use crate::graph::{
    ConnectionId, Edge, Graph, InputSet, Inputs, MergeInputs, Node, Outputs, SplitOutputs, Value,
};

/// Fluent wrapper around a pipeline [`Context`].
pub struct Builder<I, O> {
    context: Context<I, O>,
}

impl<I, O> Builder<I, O> {
    pub fn new(context: Context<I, O>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context<I, O> {
        &self.context
    }

    pub fn into_context(self) -> Context<I, O> {
        self.context
    }

    pub fn state(&self) -> ContextState {
        self.context.state()
    }

    pub fn is_complete(&self) -> bool {
        self.context.is_complete()
    }

    fn graph(&self) -> &Graph {
        self.context.graph()
    }
}

impl<I: Value> Builder<I, Unbound> {
    /// Transform the source value with `f`.
    pub fn map<O, F>(self, f: F) -> Builder<I, O>
    where
        O: Value,
        F: Fn(I) -> O + 'static,
    {
        Builder::new(self.context.with_edge(Edge::map(f)))
    }

    /// The single source node, if this builder has one.
    pub(crate) fn into_source_node(self) -> Option<Rc<Node<I>>> {
        match self.context.into_source() {
            Some(Inputs::Single(node)) => Some(node),
            _ => None,
        }
    }
}

impl<T: Value> Builder<Vec<Vec<T>>, Unbound> {
    /// Concatenate the inner sequences of the source.
    pub fn flatten(self) -> Builder<Vec<Vec<T>>, Vec<T>> {
        Builder::new(self.context.with_edge(Edge::flatten()))
    }
}

impl<T: Value> Builder<Vec<T>, Unbound> {
    /// Scatter the source sequence across destinations by position.
    ///
    /// Each argument is a destination-only builder (see
    /// [`ReactiveContext::destination`](super::ReactiveContext::destination)).
    /// Destination `i` receives element `i`, or `T::default()` when the
    /// sequence is shorter.
    ///
    /// Fails without touching the graph if the builder has no source or any
    /// argument has no single destination.
    pub fn split<D>(self, destinations: D) -> Result<ConnectionId>
    where
        D: IntoIterator<Item = Builder<Unbound, T>>,
    {
        let outputs = split_outputs(destinations)?;
        let state = self.state();
        let graph = self.graph().clone();
        let Some(source) = self.context.into_source() else {
            return Err(Error::IncompleteContext { state });
        };

        graph.connect(source, Edge::split(), outputs)
    }
}

impl<I: Value, T: Value> Builder<I, Vec<T>> {
    /// Scatter the edge's output across destinations by position, through a
    /// hidden node.
    ///
    /// Same as `self.hidden_node().split(destinations)`, except that an
    /// incomplete pipeline or destination list fails before the hidden node
    /// is wired.
    pub fn split<D>(self, destinations: D) -> Result<ConnectionId>
    where
        D: IntoIterator<Item = Builder<Unbound, T>>,
    {
        let outputs = split_outputs(destinations)?;
        let state = self.state();
        if state != ContextState::SourceAndEdge {
            return Err(Error::IncompleteContext { state });
        }

        let graph = self.graph().clone();
        let Some(source) = self.hidden_node().context.into_source() else {
            return Err(Error::IncompleteContext { state });
        };
        graph.connect(source, Edge::split(), outputs)
    }
}

/// Collect the destinations of split arguments, keeping their positions.
fn split_outputs<T, D>(destinations: D) -> Result<Outputs<Vec<T>>>
where
    T: Value,
    D: IntoIterator<Item = Builder<Unbound, T>>,
{
    let mut nodes: Vec<Rc<Node<T>>> = Vec::new();
    for (index, builder) in destinations.into_iter().enumerate() {
        let state = builder.state();
        match builder.context.into_destination() {
            Some(Outputs::Single(node)) => nodes.push(node),
            _ => {
                tracing::warn!(index, state = ?state, "split argument has no single destination");
                return Err(Error::IncompleteContext { state });
            }
        }
    }
    if nodes.is_empty() {
        return Err(Error::NoDestination);
    }
    Ok(Outputs::Multi(Rc::new(SplitOutputs::new(nodes))))
}

impl<I: Value, O: Value> Builder<I, O> {
    /// Bind the destination. Applies the pipeline if it is now complete.
    pub fn into(self, rv: &Rv<O>) -> Self {
        Self::new(
            self.context
                .with_destination(Outputs::Single(Rc::clone(rv.node()))),
        )
        .settle()
    }

    /// Bind a missing source. Applies the pipeline if it is now complete.
    pub fn from(self, rv: &Rv<I>) -> Self {
        Self::new(self.context.with_source(Inputs::Single(Rc::clone(rv.node())))).settle()
    }

    /// Send the pipeline into a fresh handle and return it.
    pub fn to(self) -> Rv<O> {
        let rv = Rv::anonymous(self.graph());
        let _ = self.into(&rv);
        rv
    }

    /// Materialize the pipeline's output as an unnamed node and continue
    /// building from it.
    ///
    /// Requires a source and an edge; otherwise the hidden node is left
    /// unconnected.
    pub fn hidden_node(self) -> Builder<O, Unbound> {
        let graph = self.graph().clone();
        let node = graph.add_anonymous_node::<O>("hidden");

        if self.state() == ContextState::SourceAndEdge {
            let context = self
                .context
                .with_destination(Outputs::Single(Rc::clone(&node)));
            if let Err(e) = context.apply() {
                tracing::warn!(error = %e, "hidden node not connected");
            }
        } else {
            tracing::warn!(state = ?self.state(), "hidden_node needs a source and an edge");
        }

        Builder::new(Context::new(&graph).with_source(Inputs::Single(node)))
    }

    /// Apply the pipeline, reporting only success.
    pub fn try_apply(&self) -> bool {
        self.context.try_apply()
    }

    fn settle(self) -> Self {
        if !self.context.is_complete() {
            return self;
        }
        if let Err(e) = self.context.apply() {
            tracing::warn!(error = %e, "pipeline not applied");
        }
        Self::new(self.context.without_destination().with_fresh_edge())
    }
}

impl<I, O> fmt::Debug for Builder<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("context", &self.context)
            .finish()
    }
}

/// Builders that can be gathered into a single merge input.
pub(crate) fn merge_inputs<T, B>(builders: B) -> Option<Rc<dyn InputSet<Vec<T>>>>
where
    T: Value,
    B: IntoIterator<Item = Builder<T, Unbound>>,
{
    let nodes = builders
        .into_iter()
        .map(|builder| builder.into_source_node())
        .collect::<Option<Vec<_>>>()?;
    if nodes.is_empty() {
        return None;
    }
    Some(Rc::new(MergeInputs::new(nodes)))
}

/// Tuples of source builders that can be joined.
pub trait JoinBuilders {
    /// The joined tuple type.
    type Output: Value;

    /// Gather the sources. `None` if any builder lacks a single source.
    fn into_inputs(self) -> Option<Rc<dyn InputSet<Self::Output>>>;
}

macro_rules! impl_join_builders {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Value),+> JoinBuilders for ($(Builder<$T, Unbound>,)+) {
            type Output = ($($T,)+);

            fn into_inputs(self) -> Option<Rc<dyn InputSet<Self::Output>>> {
                let nodes = ($(self.$idx.into_source_node()?,)+);
                Some(Rc::new(nodes))
            }
        }
    };
}

impl_join_builders!(A 0, B 1);
impl_join_builders!(A 0, B 1, C 2);
impl_join_builders!(A 0, B 1, C 2, D 3);
impl_join_builders!(A 0, B 1, C 2, D 3, E 4);
impl_join_builders!(A 0, B 1, C 2, D 3, E 4, F 5);
