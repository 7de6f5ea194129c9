//! Debugger Hooks
//!
//! A debugger mirrors graph construction and value changes to an observer.
//! It is a pure notification sink: the engine never reads anything back and
//! propagation never waits on it.
//!
//! # Identity
//!
//! Nodes and edges are reported as [`ObjectRef`]s: the kind, the graph's own
//! numeric ID and the Rust type name. The graph owns identity; a debugger only
//! stores these references to render and deduplicate what it has seen.

mod recording;
mod remote;
mod trace;

use serde::Serialize;

pub use recording::RecordingDebugger;
pub use remote::RemoteDebugger;
pub use trace::TracingDebugger;

/// Whether an [`ObjectRef`] names a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Node,
    Edge,
}

/// Opaque reference to a graph object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: u64,
    pub type_name: &'static str,
}

/// Receiver of graph notifications.
///
/// Implementations must not panic and must not block for long: every hook is
/// called inline from construction or propagation.
pub trait Debugger {
    /// A node was written. `value` is its `Debug` rendering.
    fn notify_value_change(&self, name: &str, value: &str);

    /// A reactive value handle was created under `name`.
    fn notify_rv_assigned_to(&self, name: &str);

    /// A connection using the operator `name` was registered.
    fn notify_new_operator(&self, name: &str);

    /// `node` feeds `edge`.
    fn add_edge_from(&self, node: ObjectRef, edge: ObjectRef);

    /// `edge` feeds `node`.
    fn add_edge_to(&self, edge: ObjectRef, node: ObjectRef);
}

/// One debugger notification, as recorded or sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebugEvent {
    ValueChange { name: String, value: String },
    RvAssignedTo { name: String },
    NewOperator { name: String },
    /// First sighting of an object, sent before any edge that mentions it.
    NewObject { object: ObjectRef },
    EdgeFrom { node: ObjectRef, edge: ObjectRef },
    EdgeTo { edge: ObjectRef, node: ObjectRef },
}

impl DebugEvent {
    /// Short name of the event, as used in the `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            DebugEvent::ValueChange { .. } => "value_change",
            DebugEvent::RvAssignedTo { .. } => "rv_assigned_to",
            DebugEvent::NewOperator { .. } => "new_operator",
            DebugEvent::NewObject { .. } => "new_object",
            DebugEvent::EdgeFrom { .. } => "edge_from",
            DebugEvent::EdgeTo { .. } => "edge_to",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let event = DebugEvent::EdgeFrom {
            node: ObjectRef {
                kind: ObjectKind::Node,
                id: 3,
                type_name: "i32",
            },
            edge: ObjectRef {
                kind: ObjectKind::Edge,
                id: 9,
                type_name: "fn(i32) -> f32",
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["node"]["kind"], "node");
        assert_eq!(json["node"]["id"], 3);
        assert_eq!(json["edge"]["type_name"], "fn(i32) -> f32");
    }
}
