//! Core error types for mixcast-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! all anticipated failure modes in the core graph data model.

use thiserror::Error;

/// Core errors produced by the mixcast-core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Two nodes in the same graph share a name.
    #[error("duplicate node name: '{name}'")]
    DuplicateName { name: String },

    /// A referenced node name does not exist in the graph.
    #[error("unknown node: '{name}'")]
    UnknownNode { name: String },

    /// An input reference does not resolve to any node in the graph.
    #[error("unresolved input '{input}' on node '{node}'")]
    UnresolvedInput { node: String, input: String },

    /// The graph contains a dependency cycle.
    #[error("graph cycle detected at node '{node}'")]
    GraphCycle { node: String },

    /// An input reference string could not be parsed.
    #[error("invalid input reference: '{input}'")]
    InvalidInputRef { input: String },
}
