//! Graph Nodes
//!
//! This module defines the value-holding nodes of the dataflow graph.
//!
//! A node owns exactly one value of a fixed type and an ordered list of change
//! listeners. Nodes know nothing about edges or connections: the graph is the
//! only component that walks from one node to the next.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::debug::{ObjectKind, ObjectRef};

/// Values that can live in a node.
///
/// `Default` supplies the value of a fresh node and of split destinations
/// that receive no element. `Debug` supplies the text sent to a debugger.
pub trait Value: Clone + Default + Debug + 'static {}

impl<T> Value for T where T: Clone + Default + Debug + 'static {}

/// Unique identifier for a node in the dataflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identity and type of a node, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub type_name: &'static str,
}

impl NodeInfo {
    /// The handle a debugger uses to refer to this node.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: ObjectKind::Node,
            id: self.id.raw(),
            type_name: self.type_name,
        }
    }
}

/// Identifier returned when a listener is registered, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

struct ListenerEntry<T> {
    id: ListenerId,
    priority: i32,
    callback: Callback<T>,
}

/// Change listeners of a node, kept sorted by priority.
///
/// Entries with equal priority run in insertion order.
pub struct Listeners<T> {
    entries: Vec<ListenerEntry<T>>,
    next_id: u64,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a listener after every registered one.
    pub fn push<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let priority = self.entries.last().map_or(0, |entry| entry.priority);
        let id = self.next_id();
        self.entries.push(ListenerEntry {
            id,
            priority,
            callback: Rc::new(callback),
        });
        id
    }

    /// Insert a listener after every entry with a priority `<= priority`.
    pub fn insert<F>(&mut self, priority: i32, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = self.next_id();
        let position = self
            .entries
            .partition_point(|entry| entry.priority <= priority);
        self.entries.insert(
            position,
            ListenerEntry {
                id,
                priority,
                callback: Rc::new(callback),
            },
        );
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn snapshot(&self) -> SmallVec<[Callback<T>; 4]> {
        self.entries
            .iter()
            .map(|entry| Rc::clone(&entry.callback))
            .collect()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed value holder in the dataflow graph.
///
/// Nodes are shared through `Rc`: the handle that created them and every
/// connection that reads or writes them keep them alive.
pub struct Node<T> {
    /// Unique identifier for this node.
    id: NodeId,

    /// Display name used for debugging.
    name: String,

    /// Current value.
    value: RefCell<T>,

    /// Callbacks invoked after each write.
    listeners: RefCell<Listeners<T>>,
}

impl<T: Value> Node<T> {
    /// Create a node holding `T::default()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, T::default())
    }

    /// Create a node holding the given value.
    pub fn with_value(name: impl Into<String>, value: T) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            value: RefCell::new(value),
            listeners: RefCell::new(Listeners::new()),
        }
    }

    /// Create a node named after its own ID with the given prefix.
    pub(crate) fn anonymous(prefix: &str) -> Self {
        let id = NodeId::new();
        Self {
            id,
            name: format!("{}_{}", prefix, id.raw()),
            value: RefCell::new(T::default()),
            listeners: RefCell::new(Listeners::new()),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            id: self.id,
            type_name: self.type_name(),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Store a value and run the listeners.
    ///
    /// This does not reach any downstream node; use
    /// [`Graph::propagate`](crate::graph::Graph::propagate) for a full write.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.notify_listeners();
    }

    /// Append a change listener.
    pub fn on_changed<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.listeners.borrow_mut().push(callback)
    }

    /// Register a change listener at an explicit priority.
    pub fn on_changed_with_priority<F>(&self, priority: i32, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        self.listeners.borrow_mut().insert(priority, callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify_listeners(&self) {
        // Callbacks may read the node or change its listeners.
        let callbacks = self.listeners.borrow().snapshot();
        if callbacks.is_empty() {
            return;
        }
        let value = self.get();
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Value> Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &*self.value.borrow())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Type-erased view of a node, used by the graph registry.
pub trait AnyNode {
    fn id(&self) -> NodeId;
    fn name(&self) -> &str;
    fn type_name(&self) -> &'static str;
}

impl<T: Value> AnyNode for Node<T> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}
