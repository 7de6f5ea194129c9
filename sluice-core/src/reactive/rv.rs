//! Reactive Value Handles
//!
//! An [`Rv`] is the user-facing name for one node. Reading it returns the
//! node's current value; writing it pushes the value through the graph.
//!
//! Handles are not `Clone`: each node has at most one named owner. Dropping a
//! handle does not disconnect its node, so a pipeline wired through a
//! short-lived handle keeps working.

use std::fmt;
use std::rc::Rc;

use crate::graph::{Graph, ListenerId, Node, NodeId, Value};

/// Named handle to a node in the graph.
pub struct Rv<T> {
    node: Rc<Node<T>>,
    graph: Graph,
}

impl<T: Value> Rv<T> {
    /// Create a handle to a fresh node holding `T::default()`.
    pub fn new(graph: &Graph, name: impl Into<String>) -> Self {
        Self::adopt(graph, graph.add_node(name))
    }

    /// Create a handle to a fresh node holding `value`.
    ///
    /// The initial value is not propagated.
    pub fn with_value(graph: &Graph, name: impl Into<String>, value: T) -> Self {
        let node = Rc::new(Node::with_value(name, value));
        graph.register(&node);
        Self::adopt(graph, node)
    }

    /// Create a handle named after its node ID.
    pub(crate) fn anonymous(graph: &Graph) -> Self {
        Self::adopt(graph, graph.add_anonymous_node("rv"))
    }

    fn adopt(graph: &Graph, node: Rc<Node<T>>) -> Self {
        if let Some(debugger) = graph.debugger() {
            debugger.notify_rv_assigned_to(node.name());
        }
        Self {
            node,
            graph: graph.clone(),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.node.get()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.node.with(f)
    }

    /// Write a value and propagate it downstream.
    pub fn set(&self, value: T) {
        self.graph.propagate(&self.node, value);
    }

    /// Write a value derived from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let value = self.node.with(f);
        self.set(value);
    }

    /// Append a change listener.
    pub fn on_changed<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.node.on_changed(callback)
    }

    /// Register a change listener at an explicit priority.
    ///
    /// Lower priorities run first; equal priorities run in registration order.
    pub fn on_changed_with_priority<F>(&self, priority: i32, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.node.on_changed_with_priority(priority, callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.node.remove_listener(id)
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn node(&self) -> &Rc<Node<T>> {
        &self.node
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl<T: Value> fmt::Debug for Rv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rv")
            .field("name", &self.name())
            .field("value", &self.get())
            .finish()
    }
}
