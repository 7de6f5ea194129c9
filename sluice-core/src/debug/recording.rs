//! In-memory debugger that keeps every event.

use parking_lot::Mutex;

use super::{DebugEvent, Debugger, ObjectRef};

/// Debugger that records events for later inspection.
#[derive(Debug, Default)]
pub struct RecordingDebugger {
    events: Mutex<Vec<DebugEvent>>,
}

impl RecordingDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<DebugEvent> {
        self.events.lock().clone()
    }

    /// Remove and return the recorded events.
    pub fn take(&self) -> Vec<DebugEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Values written to the node called `name`, oldest first.
    pub fn values_of(&self, name: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                DebugEvent::ValueChange { name: n, value } if n == name => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: DebugEvent) {
        self.events.lock().push(event);
    }
}

impl Debugger for RecordingDebugger {
    fn notify_value_change(&self, name: &str, value: &str) {
        self.record(DebugEvent::ValueChange {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn notify_rv_assigned_to(&self, name: &str) {
        self.record(DebugEvent::RvAssignedTo {
            name: name.to_string(),
        });
    }

    fn notify_new_operator(&self, name: &str) {
        self.record(DebugEvent::NewOperator {
            name: name.to_string(),
        });
    }

    fn add_edge_from(&self, node: ObjectRef, edge: ObjectRef) {
        self.record(DebugEvent::EdgeFrom { node, edge });
    }

    fn add_edge_to(&self, edge: ObjectRef, node: ObjectRef) {
        self.record(DebugEvent::EdgeTo { edge, node });
    }
}
