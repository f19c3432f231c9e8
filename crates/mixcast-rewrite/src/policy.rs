//! Conversion policy: which nodes the caller wants in reduced precision.
//!
//! [`ConversionPolicy`] is an immutable value object passed through every
//! stage of the rewrite, replacing ad hoc list arguments. Classification is
//! a pure set difference: `convert_set = allow − deny`. The deny list is
//! authoritative -- a name present in both lists is never converted. Nodes
//! mentioned in neither list default to unconverted; conversion never
//! propagates beyond the explicit allow list.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use mixcast_core::GraphIndex;

use crate::error::{ListKind, RewriteError};

/// How the convert set is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteMode {
    /// Convert exactly the allow-listed nodes (minus denied ones).
    #[default]
    Selective,
    /// Convert every node with a convertible operator kind, minus denied
    /// ones. The allow list is ignored.
    Force,
}

/// Immutable allow/deny node sets for one rewrite invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPolicy {
    allow: IndexSet<String>,
    deny: IndexSet<String>,
}

impl ConversionPolicy {
    /// Builds a policy from allow and deny name lists.
    pub fn new<A, D>(allow: A, deny: D) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        ConversionPolicy {
            allow: allow.into_iter().map(Into::into).collect(),
            deny: deny.into_iter().map(Into::into).collect(),
        }
    }

    /// The allow-listed names, in insertion order.
    pub fn allow(&self) -> &IndexSet<String> {
        &self.allow
    }

    /// The deny-listed names, in insertion order.
    pub fn deny(&self) -> &IndexSet<String> {
        &self.deny
    }

    /// Returns `true` if `name` is explicitly denied.
    pub fn is_denied(&self, name: &str) -> bool {
        self.deny.contains(name)
    }

    /// Checks that every listed name exists in the graph.
    ///
    /// Runs eagerly before any mutation so a bad list aborts the whole
    /// rewrite (all-or-nothing).
    pub fn validate(&self, index: &GraphIndex) -> Result<(), RewriteError> {
        for name in &self.allow {
            if !index.contains(name) {
                return Err(RewriteError::UnknownListEntry {
                    name: name.clone(),
                    list: ListKind::Allow,
                });
            }
        }
        for name in &self.deny {
            if !index.contains(name) {
                return Err(RewriteError::UnknownListEntry {
                    name: name.clone(),
                    list: ListKind::Deny,
                });
            }
        }
        Ok(())
    }

    /// Computes `allow − deny`, preserving allow-list order.
    ///
    /// Fails with [`RewriteError::UnknownListEntry`] if either list names a
    /// node absent from the graph.
    pub fn classify(&self, index: &GraphIndex) -> Result<IndexSet<String>, RewriteError> {
        self.validate(index)?;
        Ok(self
            .allow
            .iter()
            .filter(|name| !self.deny.contains(*name))
            .cloned()
            .collect())
    }
}
