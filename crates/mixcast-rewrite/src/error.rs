//! Rewrite error types.
//!
//! Structural errors (duplicate or unknown names) abort a rewrite before any
//! mutation; [`RewriteError::UnsupportedOperator`] is recoverable and only
//! ever surfaces from the strict retype entry points -- the conversion
//! pipeline downgrades it to a skip.

use thiserror::Error;

use mixcast_core::CoreError;

/// Which caller-supplied list referenced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Allow,
    Deny,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Allow => write!(f, "allow"),
            ListKind::Deny => write!(f, "deny"),
        }
    }
}

/// Errors produced by the precision-conversion rewriter.
#[derive(Debug, Clone, Error)]
pub enum RewriteError {
    /// A structural error surfaced by the core graph model.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The allow or deny list names a node that is not in the graph.
    #[error("unknown node '{name}' in {list} list")]
    UnknownListEntry { name: String, list: ListKind },

    /// A node's operator kind has no known numeric-type attribute, so it
    /// cannot be retyped.
    #[error("operator '{op}' on node '{name}' has no convertible type attribute")]
    UnsupportedOperator { name: String, op: String },
}
