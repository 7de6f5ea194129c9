//! Error types for the dataflow engine.
//!
//! Type mismatches between pipeline stages never show up here: the builder
//! rejects them at compile time. What remains are programming errors that can
//! only be detected when a connection is applied, plus failures of the ambient
//! layers (configuration, debugger transport).

use thiserror::Error;

use crate::graph::NodeId;
use crate::reactive::ContextState;

/// Errors produced by the graph, the builder and the configuration layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A context was applied before source, edge and destination were bound.
    #[error("cannot apply an incomplete context (state: {state:?})")]
    IncompleteContext { state: ContextState },

    /// A connection was registered without any destination node.
    #[error("connection has no destination")]
    NoDestination,

    /// The same node appeared twice in the destination set of one connection.
    #[error("node {0:?} appears more than once in the destination set")]
    DuplicateDestination(NodeId),

    /// The engine configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// An environment variable held a value the configuration does not accept.
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },

    /// The remote debugger could not encode or deliver an event.
    #[error("debugger transport failed: {0}")]
    Debugger(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
