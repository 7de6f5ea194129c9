//! Dataflow Graph
//!
//! This module implements the graph of typed nodes and typed edges that values
//! flow through.
//!
//! # Overview
//!
//! - Nodes hold one value of a fixed type plus ordered change listeners
//! - Edges are pure functions between source and destination value types
//! - Connections bind source node(s), one edge and destination node(s)
//!
//! Writing a node pushes the new value synchronously through every connection
//! that reads it, depth first, in registration order.
//!
//! # Design Decisions
//!
//! 1. The graph does not know about pipelines. The builder in
//!    [`crate::reactive`] describes them and hands the graph finished
//!    connections.
//!
//! 2. Connections are type-erased behind a trait object so that one registry
//!    holds every value type; the typed halves never meet at runtime, so no
//!    downcasting is involved.
//!
//! 3. Nodes are shared through `Rc`. The engine is single-threaded and
//!    provides no locking of its own.

mod connection;
mod edge;
mod node;
mod propagation;

pub use connection::{
    ConnectionId, InputSet, Inputs, MergeInputs, NodeInfos, OutputSet, Outputs, SplitOutputs,
};
pub use edge::{Edge, EdgeId, EdgeKind};
pub use node::{AnyNode, ListenerId, Listeners, Node, NodeId, NodeInfo, Value};
pub use propagation::Graph;
