//! Name-based input references.
//!
//! Graph edges are expressed on the consumer side: each node lists the names
//! of the nodes it reads from. A reference may qualify which output of the
//! producer it reads (`name:2`) or mark a pure ordering dependency that
//! carries no data (`^name`). References serialize as their string form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A reference from a consumer node to one of its producers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct InputRef {
    /// Name of the producer node.
    pub node: String,
    /// Which output of the producer is read. Output 0 is the common case and
    /// prints without a qualifier.
    pub output: u32,
    /// Control dependency: ordering only, no value flows.
    pub control: bool,
}

impl InputRef {
    /// A data reference to the producer's first output.
    pub fn new(node: impl Into<String>) -> Self {
        InputRef {
            node: node.into(),
            output: 0,
            control: false,
        }
    }

    /// A data reference to a specific producer output.
    pub fn with_output(node: impl Into<String>, output: u32) -> Self {
        InputRef {
            node: node.into(),
            output,
            control: false,
        }
    }

    /// A control (ordering-only) reference.
    pub fn control(node: impl Into<String>) -> Self {
        InputRef {
            node: node.into(),
            output: 0,
            control: true,
        }
    }

    /// Returns a copy of this reference pointing at a different producer's
    /// primary output, keeping the control flag.
    pub fn redirected(&self, node: impl Into<String>) -> Self {
        InputRef {
            node: node.into(),
            output: 0,
            control: self.control,
        }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.control {
            write!(f, "^{}", self.node)
        } else if self.output == 0 {
            write!(f, "{}", self.node)
        } else {
            write!(f, "{}:{}", self.node, self.output)
        }
    }
}

impl FromStr for InputRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInputRef { input: s.to_string() };

        if let Some(rest) = s.strip_prefix('^') {
            // Control references never carry an output qualifier.
            if rest.is_empty() || rest.contains(':') {
                return Err(invalid());
            }
            return Ok(InputRef::control(rest));
        }

        match s.split_once(':') {
            Some((name, idx)) => {
                if name.is_empty() {
                    return Err(invalid());
                }
                let output: u32 = idx.parse().map_err(|_| invalid())?;
                Ok(InputRef::with_output(name, output))
            }
            None => {
                if s.is_empty() {
                    return Err(invalid());
                }
                Ok(InputRef::new(s))
            }
        }
    }
}

// Bridge for serde's string form.

impl From<InputRef> for String {
    fn from(r: InputRef) -> Self {
        r.to_string()
    }
}

impl TryFrom<String> for InputRef {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
