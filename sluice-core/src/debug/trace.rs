//! Debugger that forwards notifications to `tracing`.

use super::{Debugger, ObjectRef};

/// Emits every notification as a debug-level `tracing` event under the
/// `sluice::debugger` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDebugger;

impl Debugger for TracingDebugger {
    fn notify_value_change(&self, name: &str, value: &str) {
        tracing::debug!(target: "sluice::debugger", name, value, "value change");
    }

    fn notify_rv_assigned_to(&self, name: &str) {
        tracing::debug!(target: "sluice::debugger", name, "rv assigned");
    }

    fn notify_new_operator(&self, name: &str) {
        tracing::debug!(target: "sluice::debugger", name, "new operator");
    }

    fn add_edge_from(&self, node: ObjectRef, edge: ObjectRef) {
        tracing::debug!(
            target: "sluice::debugger",
            node = node.id,
            node_type = node.type_name,
            edge = edge.id,
            edge_type = edge.type_name,
            "edge from"
        );
    }

    fn add_edge_to(&self, edge: ObjectRef, node: ObjectRef) {
        tracing::debug!(
            target: "sluice::debugger",
            edge = edge.id,
            edge_type = edge.type_name,
            node = node.id,
            node_type = node.type_name,
            "edge to"
        );
    }
}
