//! Graph and Propagation
//!
//! The graph is the registry of nodes and connections, and the only component
//! that moves values from one node to the next.
//!
//! # Algorithm
//!
//! A write is a synchronous, depth-first push walk:
//!
//! 1. Store the new value in the node and run its listeners in order
//! 2. For every connection reading the node, in registration order:
//!    - read the current value of *all* its sources
//!    - evaluate the edge
//!    - write the result into each destination, recursing into step 1
//!
//! The caller's write returns only once the whole cascade has run. There is
//! no cycle detection; wiring a node into its own upstream recurses without
//! bound.
//!
//! # Rebind
//!
//! A destination has at most one incoming connection. Connecting into a bound
//! destination detaches it from the previous connection ("last wiring wins");
//! a connection left without destinations is dropped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::connection::{Connection, ConnectionId, Inputs, Outputs, Propagate};
use super::edge::Edge;
use super::node::{AnyNode, Node, NodeId, Value};
use crate::debug::Debugger;
use crate::error::{Error, Result};

#[derive(Default)]
struct GraphState {
    /// Registered nodes. Connections and handles own them, the graph only
    /// looks them up.
    nodes: HashMap<NodeId, Weak<dyn AnyNode>>,

    /// All connections, in registration order.
    connections: IndexMap<ConnectionId, Rc<dyn Propagate>>,

    /// The single connection feeding each bound destination.
    incoming: HashMap<NodeId, ConnectionId>,

    /// Connections reading each source, in registration order.
    outgoing: HashMap<NodeId, SmallVec<[ConnectionId; 4]>>,
}

impl GraphState {
    fn remove_connection(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.shift_remove(&id) else {
            return;
        };
        for source in connection.sources() {
            if let Some(list) = self.outgoing.get_mut(&source.id) {
                list.retain(|c| *c != id);
                if list.is_empty() {
                    self.outgoing.remove(&source.id);
                }
            }
        }
        for destination in connection.destinations() {
            if self.incoming.get(&destination.id) == Some(&id) {
                self.incoming.remove(&destination.id);
            }
        }
    }

    /// Detach `node` from whatever feeds it.
    fn unbind(&mut self, node: NodeId) -> Option<ConnectionId> {
        let previous = self.incoming.remove(&node)?;
        let orphaned = self
            .connections
            .get(&previous)
            .map_or(false, |connection| connection.detach(node));
        if orphaned {
            self.remove_connection(previous);
        }
        Some(previous)
    }
}

struct GraphInner {
    state: RefCell<GraphState>,
    debugger: Option<Rc<dyn Debugger>>,
}

/// The dataflow graph.
///
/// Cloning a `Graph` yields another handle to the same registry.
#[derive(Clone)]
pub struct Graph {
    inner: Rc<GraphInner>,
}

impl Graph {
    /// Create an empty graph with no debugger attached.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty graph that reports to `debugger`.
    pub fn with_debugger(debugger: Rc<dyn Debugger>) -> Self {
        Self::build(Some(debugger))
    }

    fn build(debugger: Option<Rc<dyn Debugger>>) -> Self {
        Self {
            inner: Rc::new(GraphInner {
                state: RefCell::new(GraphState::default()),
                debugger,
            }),
        }
    }

    pub fn debugger(&self) -> Option<&Rc<dyn Debugger>> {
        self.inner.debugger.as_ref()
    }

    /// Create a node and register it with the graph.
    pub fn add_node<T: Value>(&self, name: impl Into<String>) -> Rc<Node<T>> {
        let node = Rc::new(Node::new(name));
        self.register(&node);
        node
    }

    /// Create an unnamed intermediate node.
    pub(crate) fn add_anonymous_node<T: Value>(&self, prefix: &str) -> Rc<Node<T>> {
        let node = Rc::new(Node::anonymous(prefix));
        self.register(&node);
        node
    }

    /// Register a node created elsewhere.
    pub fn register<T: Value>(&self, node: &Rc<Node<T>>) {
        let erased: Rc<dyn AnyNode> = node.clone();
        let mut state = self.inner.state.borrow_mut();
        state.nodes.retain(|_, weak| weak.strong_count() > 0);
        state.nodes.insert(node.id(), Rc::downgrade(&erased));
    }

    /// Register a connection from `inputs` through `edge` into `outputs`.
    ///
    /// Any destination that already has an incoming connection is rebound.
    /// On error the graph is left unchanged.
    pub fn connect<I: Value, O: Value>(
        &self,
        inputs: Inputs<I>,
        edge: Edge<I, O>,
        outputs: Outputs<O>,
    ) -> Result<ConnectionId> {
        let destinations = outputs.nodes();
        if destinations.is_empty() {
            return Err(Error::NoDestination);
        }
        for (i, destination) in destinations.iter().enumerate() {
            if destinations[..i].iter().any(|d| d.id == destination.id) {
                return Err(Error::DuplicateDestination(destination.id));
            }
        }

        let connection: Rc<dyn Propagate> = Rc::new(Connection::new(inputs, edge, outputs));
        let id = connection.id();
        let sources = connection.sources();
        {
            let mut state = self.inner.state.borrow_mut();
            for destination in &destinations {
                if let Some(previous) = state.unbind(destination.id) {
                    tracing::debug!(
                        node = destination.id.raw(),
                        previous = previous.raw(),
                        connection = id.raw(),
                        "rebinding destination"
                    );
                }
                state.incoming.insert(destination.id, id);
            }
            // A node listed twice as a source still fires the connection once.
            for source in &sources {
                let list = state.outgoing.entry(source.id).or_default();
                if !list.contains(&id) {
                    list.push(id);
                }
            }
            state.connections.insert(id, Rc::clone(&connection));
        }

        tracing::debug!(
            connection = id.raw(),
            kind = %connection.kind(),
            sources = sources.len(),
            destinations = destinations.len(),
            "connected"
        );

        if let Some(debugger) = self.debugger() {
            let edge = connection.edge_ref();
            debugger.notify_new_operator(connection.kind().name());
            for source in &sources {
                debugger.add_edge_from(source.object_ref(), edge);
            }
            for destination in &destinations {
                debugger.add_edge_to(edge, destination.object_ref());
            }
        }

        Ok(id)
    }

    /// Remove the incoming connection of `node`.
    ///
    /// Returns false if the node was not bound.
    pub fn disconnect(&self, node: NodeId) -> bool {
        let previous = self.inner.state.borrow_mut().unbind(node);
        if let Some(previous) = previous {
            tracing::debug!(node = node.raw(), connection = previous.raw(), "disconnected");
        }
        previous.is_some()
    }

    /// Write `value` into `node` and push it through every downstream edge.
    pub fn propagate<T: Value>(&self, node: &Node<T>, value: T) {
        tracing::trace!(node = node.id().raw(), name = node.name(), "propagate");

        let text = self.debugger().map(|_| format!("{:?}", value));
        node.set(value);
        if let (Some(debugger), Some(text)) = (self.debugger(), text) {
            debugger.notify_value_change(node.name(), &text);
        }

        // Snapshot so that edges and listeners may rewire the graph.
        let downstream: SmallVec<[Rc<dyn Propagate>; 4]> = {
            let state = self.inner.state.borrow();
            state
                .outgoing
                .get(&node.id())
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| state.connections.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };

        for connection in downstream {
            connection.fire(self);
        }
    }

    /// Number of live registered nodes.
    pub fn node_count(&self) -> usize {
        self.inner
            .state
            .borrow()
            .nodes
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Name of a live registered node.
    pub fn node_name(&self, node: NodeId) -> Option<String> {
        let state = self.inner.state.borrow();
        let node = state.nodes.get(&node)?.upgrade()?;
        Some(node.name().to_string())
    }

    pub fn connection_count(&self) -> usize {
        self.inner.state.borrow().connections.len()
    }

    /// The connection feeding `node`, if any.
    pub fn incoming(&self, node: NodeId) -> Option<ConnectionId> {
        self.inner.state.borrow().incoming.get(&node).copied()
    }

    /// The connections reading `node`, in registration order.
    pub fn outgoing(&self, node: NodeId) -> Vec<ConnectionId> {
        self.inner
            .state
            .borrow()
            .outgoing
            .get(&node)
            .map(|ids| ids.to_vec())
            .unwrap_or_default()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.node_count())
            .field("connection_count", &self.connection_count())
            .field("debugger", &self.inner.debugger.is_some())
            .finish()
    }
}
