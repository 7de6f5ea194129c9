//! Pipeline Context
//!
//! A context describes a pipeline under construction: which of its three
//! slots (source, edge, destination) are bound. Contexts are immutable
//! values; every step consumes one and returns a new one with one more slot
//! filled. A context never mutates the graph until it is applied.
//!
//! # Slot typing
//!
//! `Context<I, O>` carries the edge's input and output types. A slot that is
//! not bound yet and cannot be typed is marked with [`Unbound`]:
//!
//! - `Context<T, Unbound>`: at most a source, no edge possible yet
//! - `Context<Unbound, T>`: at most a destination
//! - `Context<I, O>`: any combination, edge typed `I -> O`
//!
//! Because `Unbound` has no values, a mismatched pipeline fails to compile
//! rather than failing at runtime.

use std::fmt;

use crate::error::{Error, Result};
use crate::graph::{ConnectionId, Edge, Graph, Inputs, Outputs, Value};

/// Marker for a slot type that is not known yet.
///
/// Uninhabited: no node, edge or value of this type can exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbound {}

/// How a node slot is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Empty,
    /// One node.
    Single,
    /// A node set (merge/join sources, split destinations).
    Multi,
}

/// Which slots of a context are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Empty,
    SourceOnly,
    EdgeOnly,
    DestinationOnly,
    SourceAndEdge,
    EdgeAndDestination,
    SourceAndDestination,
    Complete,
}

/// Immutable descriptor of a pipeline under construction.
pub struct Context<I, O> {
    graph: Graph,
    source: Option<Inputs<I>>,
    edge: Option<Edge<I, O>>,
    destination: Option<Outputs<O>>,
}

impl<I, O> Context<I, O> {
    /// A context with no slot bound.
    pub fn new(graph: &Graph) -> Self {
        Self {
            graph: graph.clone(),
            source: None,
            edge: None,
            destination: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn has_edge(&self) -> bool {
        self.edge.is_some()
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_source() && self.has_edge() && self.has_destination()
    }

    pub fn state(&self) -> ContextState {
        match (self.has_source(), self.has_edge(), self.has_destination()) {
            (false, false, false) => ContextState::Empty,
            (true, false, false) => ContextState::SourceOnly,
            (false, true, false) => ContextState::EdgeOnly,
            (false, false, true) => ContextState::DestinationOnly,
            (true, true, false) => ContextState::SourceAndEdge,
            (false, true, true) => ContextState::EdgeAndDestination,
            (true, false, true) => ContextState::SourceAndDestination,
            (true, true, true) => ContextState::Complete,
        }
    }

    pub fn source_kind(&self) -> SlotKind {
        match &self.source {
            None => SlotKind::Empty,
            Some(Inputs::Single(_)) => SlotKind::Single,
            Some(Inputs::Multi(_)) => SlotKind::Multi,
        }
    }

    pub fn destination_kind(&self) -> SlotKind {
        match &self.destination {
            None => SlotKind::Empty,
            Some(Outputs::Single(_)) => SlotKind::Single,
            Some(Outputs::Multi(_)) => SlotKind::Multi,
        }
    }

    pub fn source(&self) -> Option<&Inputs<I>> {
        self.source.as_ref()
    }

    pub fn edge(&self) -> Option<&Edge<I, O>> {
        self.edge.as_ref()
    }

    pub fn destination(&self) -> Option<&Outputs<O>> {
        self.destination.as_ref()
    }

    /// Bind the source slot. A bound slot is left as it is.
    pub fn with_source(mut self, source: Inputs<I>) -> Self {
        if self.source.is_some() {
            tracing::warn!(state = ?self.state(), "source slot already bound, ignoring");
        } else {
            self.source = Some(source);
        }
        self
    }

    /// Bind the destination slot. A bound slot is left as it is.
    pub fn with_destination(mut self, destination: Outputs<O>) -> Self {
        if self.destination.is_some() {
            tracing::warn!(state = ?self.state(), "destination slot already bound, ignoring");
        } else {
            self.destination = Some(destination);
        }
        self
    }

    /// The same context with the destination slot emptied.
    pub(crate) fn without_destination(mut self) -> Self {
        self.destination = None;
        self
    }

    /// The same context with the edge replaced by a fresh copy of itself.
    pub(crate) fn with_fresh_edge(mut self) -> Self
    where
        I: 'static,
        O: 'static,
    {
        self.edge = self.edge.map(|edge| edge.duplicate());
        self
    }

    pub(crate) fn into_source(self) -> Option<Inputs<I>> {
        self.source
    }

    pub(crate) fn into_destination(self) -> Option<Outputs<O>> {
        self.destination
    }
}

impl<I> Context<I, Unbound> {
    /// Bind the edge slot, fixing the output type.
    pub fn with_edge<O>(self, edge: Edge<I, O>) -> Context<I, O> {
        Context {
            graph: self.graph,
            source: self.source,
            edge: Some(edge),
            destination: None,
        }
    }
}

impl<I: Value, O: Value> Context<I, O> {
    /// Register the described connection with the graph.
    pub fn apply(&self) -> Result<ConnectionId> {
        match (&self.source, &self.edge, &self.destination) {
            (Some(source), Some(edge), Some(destination)) => {
                self.graph
                    .connect(source.clone(), edge.clone(), destination.clone())
            }
            _ => Err(Error::IncompleteContext {
                state: self.state(),
            }),
        }
    }

    /// [`apply`](Self::apply) reporting only success.
    ///
    /// False means the graph was left unchanged.
    pub fn try_apply(&self) -> bool {
        match self.apply() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "context not applied");
                false
            }
        }
    }
}

impl<I, O> fmt::Debug for Context<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state())
            .field("source", &self.source_kind())
            .field("edge", &self.edge)
            .field("destination", &self.destination_kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MergeInputs, Node};
    use std::rc::Rc;

    #[test]
    fn complete_context_applies() {
        let graph = Graph::new();
        let n1 = graph.add_node::<i32>("n1");
        let n2 = graph.add_node::<i32>("n2");

        let context = Context::<i32, Unbound>::new(&graph)
            .with_source(Inputs::Single(n1.clone()))
            .with_edge(Edge::map(|n: i32| n))
            .with_destination(Outputs::Single(n2.clone()));

        assert_eq!(context.state(), ContextState::Complete);
        assert!(context.try_apply());

        graph.propagate(&n1, 11);
        assert_eq!(n2.get(), 11);
    }

    #[test]
    fn incomplete_context_leaves_graph_unchanged() {
        let graph = Graph::new();
        let n1 = graph.add_node::<i32>("n1");

        let context = Context::<i32, Unbound>::new(&graph).with_source(Inputs::Single(n1));
        assert_eq!(context.state(), ContextState::SourceOnly);
        assert!(!context.is_complete());

        let context = context.with_edge(Edge::map(|n: i32| n * 2));
        assert_eq!(context.state(), ContextState::SourceAndEdge);
        assert!(!context.try_apply());
        assert!(matches!(
            context.apply(),
            Err(Error::IncompleteContext {
                state: ContextState::SourceAndEdge
            })
        ));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn bound_slot_is_not_overwritten() {
        let graph = Graph::new();
        let first = graph.add_node::<i32>("first");
        let second = graph.add_node::<i32>("second");

        let context = Context::<i32, Unbound>::new(&graph)
            .with_source(Inputs::Single(first.clone()))
            .with_source(Inputs::Single(second));

        match context.source() {
            Some(Inputs::Single(node)) => assert_eq!(node.id(), first.id()),
            _ => panic!("expected a single source"),
        }
    }

    #[test]
    fn slot_kinds_distinguish_single_and_multi() {
        let graph = Graph::new();
        let a: Rc<Node<i32>> = graph.add_node("a");
        let b: Rc<Node<i32>> = graph.add_node("b");

        let context = Context::<Vec<i32>, Unbound>::new(&graph)
            .with_source(Inputs::Multi(Rc::new(MergeInputs::new([a, b]))));

        assert_eq!(context.source_kind(), SlotKind::Multi);
        assert_eq!(context.destination_kind(), SlotKind::Empty);
        assert!(!context.has_edge());
    }
}
