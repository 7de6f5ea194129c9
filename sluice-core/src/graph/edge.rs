//! Graph Edges
//!
//! An edge is a pure function from the value(s) of its source node(s) to the
//! value(s) of its destination node(s). Aggregation across several nodes is
//! not the edge's job: the connection gathers inputs into `I` and scatters
//! `O` across outputs. That keeps every variant a plain `I -> O` function:
//!
//! | Kind      | `I`              | `O`          |
//! |-----------|------------------|--------------|
//! | `Map`     | `A`              | `B`          |
//! | `Merge`   | `Vec<T>`         | `Vec<T>`     |
//! | `Join`    | `(A, B, ...)`    | same tuple   |
//! | `Split`   | `Vec<T>`         | `Vec<T>`     |
//! | `Flatten` | `Vec<Vec<T>>`    | `Vec<T>`     |

use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::debug::{ObjectKind, ObjectRef};

/// Unique identifier for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// The transformation an edge performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// One source, one destination, caller-supplied function.
    Map,
    /// Homogeneous sources gathered into a sequence in argument order.
    Merge,
    /// Heterogeneous sources gathered into a tuple in argument order.
    Join,
    /// One sequence scattered across destinations by position.
    Split,
    /// One level of sequence nesting removed.
    Flatten,
}

impl EdgeKind {
    /// Operator name reported to debuggers.
    pub fn name(&self) -> &'static str {
        match self {
            EdgeKind::Map => "map",
            EdgeKind::Merge => "merge",
            EdgeKind::Join => "join",
            EdgeKind::Split => "split",
            EdgeKind::Flatten => "flatten",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed transformation from `I` to `O`.
///
/// Edges are immutable. Rebinding a destination replaces the whole
/// connection, edge included.
pub struct Edge<I, O> {
    id: EdgeId,
    kind: EdgeKind,
    func: Rc<dyn Fn(I) -> O>,
}

impl<I: 'static, O: 'static> Edge<I, O> {
    fn new(kind: EdgeKind, func: Rc<dyn Fn(I) -> O>) -> Self {
        Self {
            id: EdgeId::new(),
            kind,
            func,
        }
    }

    /// A caller-supplied `I -> O` function.
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(I) -> O + 'static,
    {
        Self::new(EdgeKind::Map, Rc::new(f))
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Evaluate the edge.
    pub fn apply(&self, input: I) -> O {
        (self.func)(input)
    }

    /// The same function under a new identity, for a second connection.
    pub fn duplicate(&self) -> Self {
        Self {
            id: EdgeId::new(),
            kind: self.kind,
            func: Rc::clone(&self.func),
        }
    }

    /// The handle a debugger uses to refer to this edge.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: ObjectKind::Edge,
            id: self.id.raw(),
            type_name: type_name::<fn(I) -> O>(),
        }
    }
}

impl<T: 'static> Edge<Vec<T>, Vec<T>> {
    /// Pass the gathered sequence through unchanged.
    pub fn merge() -> Self {
        Self::new(EdgeKind::Merge, Rc::new(|values| values))
    }

    /// Pass the sequence through for scattering across destinations.
    pub fn split() -> Self {
        Self::new(EdgeKind::Split, Rc::new(|values| values))
    }
}

impl<T: 'static> Edge<T, T> {
    /// Pass the gathered tuple through unchanged.
    pub fn join() -> Self {
        Self::new(EdgeKind::Join, Rc::new(|values| values))
    }
}

impl<T: 'static> Edge<Vec<Vec<T>>, Vec<T>> {
    /// Concatenate inner sequences in order.
    pub fn flatten() -> Self {
        Self::new(
            EdgeKind::Flatten,
            Rc::new(|nested: Vec<Vec<T>>| nested.into_iter().flatten().collect()),
        )
    }
}

impl<I, O> Clone for Edge<I, O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            func: Rc::clone(&self.func),
        }
    }
}

impl<I, O> fmt::Debug for Edge<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
