//! Connections
//!
//! A connection is a registered (sources, edge, destinations) triple. Both
//! ends come in two shapes:
//!
//! - a single node (`map`, `flatten`, the source of `split`, the destination
//!   of `merge` and `join`)
//! - a node set that gathers several inputs into one value (`merge`, `join`)
//!   or scatters one value across several outputs (`split`)
//!
//! The graph stores connections behind the type-erased [`Propagate`] trait so
//! that differently typed connections can share one registry.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::{smallvec, SmallVec};

use super::edge::{Edge, EdgeKind};
use super::node::{Node, NodeId, NodeInfo, Value};
use super::propagation::Graph;
use crate::debug::ObjectRef;

/// Node identities of one end of a connection.
pub type NodeInfos = SmallVec<[NodeInfo; 4]>;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Several source nodes read together into one edge input.
pub trait InputSet<I> {
    /// Read the current value of every node.
    fn read(&self) -> I;

    fn nodes(&self) -> NodeInfos;
}

/// Several destination nodes written together from one edge output.
pub trait OutputSet<O> {
    /// Write `value` across the nodes, skipping the `detached` ones.
    fn write(&self, graph: &Graph, value: O, detached: &[NodeId]);

    fn nodes(&self) -> NodeInfos;
}

/// The bound source end of a connection.
pub enum Inputs<I> {
    Single(Rc<Node<I>>),
    Multi(Rc<dyn InputSet<I>>),
}

impl<I: Value> Inputs<I> {
    pub fn read(&self) -> I {
        match self {
            Inputs::Single(node) => node.get(),
            Inputs::Multi(set) => set.read(),
        }
    }

    pub fn nodes(&self) -> NodeInfos {
        match self {
            Inputs::Single(node) => smallvec![node.info()],
            Inputs::Multi(set) => set.nodes(),
        }
    }
}

impl<I> Clone for Inputs<I> {
    fn clone(&self) -> Self {
        match self {
            Inputs::Single(node) => Inputs::Single(Rc::clone(node)),
            Inputs::Multi(set) => Inputs::Multi(Rc::clone(set)),
        }
    }
}

/// The bound destination end of a connection.
pub enum Outputs<O> {
    Single(Rc<Node<O>>),
    Multi(Rc<dyn OutputSet<O>>),
}

impl<O: Value> Outputs<O> {
    pub fn write(&self, graph: &Graph, value: O, detached: &[NodeId]) {
        match self {
            Outputs::Single(node) => {
                if !detached.contains(&node.id()) {
                    graph.propagate(node, value);
                }
            }
            Outputs::Multi(set) => set.write(graph, value, detached),
        }
    }

    pub fn nodes(&self) -> NodeInfos {
        match self {
            Outputs::Single(node) => smallvec![node.info()],
            Outputs::Multi(set) => set.nodes(),
        }
    }
}

impl<O> Clone for Outputs<O> {
    fn clone(&self) -> Self {
        match self {
            Outputs::Single(node) => Outputs::Single(Rc::clone(node)),
            Outputs::Multi(set) => Outputs::Multi(Rc::clone(set)),
        }
    }
}

/// Homogeneous sources gathered into a `Vec` in argument order.
pub struct MergeInputs<T> {
    nodes: SmallVec<[Rc<Node<T>>; 4]>,
}

impl<T: Value> MergeInputs<T> {
    pub fn new(nodes: impl IntoIterator<Item = Rc<Node<T>>>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Value> InputSet<Vec<T>> for MergeInputs<T> {
    fn read(&self) -> Vec<T> {
        self.nodes.iter().map(|node| node.get()).collect()
    }

    fn nodes(&self) -> NodeInfos {
        self.nodes.iter().map(|node| node.info()).collect()
    }
}

macro_rules! impl_join_inputs {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Value),+> InputSet<($($T,)+)> for ($(Rc<Node<$T>>,)+) {
            fn read(&self) -> ($($T,)+) {
                ($(self.$idx.get(),)+)
            }

            fn nodes(&self) -> NodeInfos {
                smallvec![$(self.$idx.info()),+]
            }
        }
    };
}

impl_join_inputs!(A 0, B 1);
impl_join_inputs!(A 0, B 1, C 2);
impl_join_inputs!(A 0, B 1, C 2, D 3);
impl_join_inputs!(A 0, B 1, C 2, D 3, E 4);
impl_join_inputs!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Destinations fed by position from one sequence.
///
/// Destination `i` receives element `i`, or `T::default()` when the sequence
/// is shorter than the destination list.
pub struct SplitOutputs<T> {
    nodes: SmallVec<[Rc<Node<T>>; 4]>,
}

impl<T: Value> SplitOutputs<T> {
    pub fn new(nodes: impl IntoIterator<Item = Rc<Node<T>>>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Value> OutputSet<Vec<T>> for SplitOutputs<T> {
    fn write(&self, graph: &Graph, value: Vec<T>, detached: &[NodeId]) {
        let mut elements = value.into_iter();
        for node in &self.nodes {
            let element = elements.next().unwrap_or_default();
            if !detached.contains(&node.id()) {
                graph.propagate(node, element);
            }
        }
    }

    fn nodes(&self) -> NodeInfos {
        self.nodes.iter().map(|node| node.info()).collect()
    }
}

/// Type-erased connection as stored by the graph.
pub(crate) trait Propagate {
    fn id(&self) -> ConnectionId;

    fn kind(&self) -> EdgeKind;

    fn edge_ref(&self) -> ObjectRef;

    fn sources(&self) -> NodeInfos;

    /// Every destination, detached ones included.
    fn destinations(&self) -> NodeInfos;

    /// Evaluate the edge against all sources and write the destinations.
    fn fire(&self, graph: &Graph);

    /// Stop writing to `node`. Returns true once no destination is left.
    fn detach(&self, node: NodeId) -> bool;
}

pub(crate) struct Connection<I, O> {
    id: ConnectionId,
    inputs: Inputs<I>,
    edge: Edge<I, O>,
    outputs: Outputs<O>,
    detached: RefCell<SmallVec<[NodeId; 2]>>,
}

impl<I: Value, O: Value> Connection<I, O> {
    pub(crate) fn new(inputs: Inputs<I>, edge: Edge<I, O>, outputs: Outputs<O>) -> Self {
        Self {
            id: ConnectionId::new(),
            inputs,
            edge,
            outputs,
            detached: RefCell::new(SmallVec::new()),
        }
    }
}

impl<I: Value, O: Value> Propagate for Connection<I, O> {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn kind(&self) -> EdgeKind {
        self.edge.kind()
    }

    fn edge_ref(&self) -> ObjectRef {
        self.edge.object_ref()
    }

    fn sources(&self) -> NodeInfos {
        self.inputs.nodes()
    }

    fn destinations(&self) -> NodeInfos {
        self.outputs.nodes()
    }

    fn fire(&self, graph: &Graph) {
        let input = self.inputs.read();
        let output = self.edge.apply(input);
        // Released before writing: a listener downstream may rebind.
        let detached = self.detached.borrow().clone();
        self.outputs.write(graph, output, &detached);
    }

    fn detach(&self, node: NodeId) -> bool {
        let mut detached = self.detached.borrow_mut();
        if !detached.contains(&node) {
            detached.push(node);
        }
        self.outputs
            .nodes()
            .iter()
            .all(|info| detached.contains(&info.id))
    }
}
