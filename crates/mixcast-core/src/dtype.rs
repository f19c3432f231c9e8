//! Numeric element types carried by graph operators.
//!
//! Precision conversion only ever moves values between [`DataType::Float32`]
//! (the native width) and [`DataType::BFloat16`] (the reduced width); the
//! remaining variants exist so attribute bags can represent graphs that mix
//! integer and boolean tensors without loss.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of a tensor value flowing along a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Float32,
    BFloat16,
    Float16,
    Float64,
    Int32,
    Int64,
    Bool,
}

impl DataType {
    /// Returns `true` for floating-point element types.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            DataType::Float32 | DataType::BFloat16 | DataType::Float16 | DataType::Float64
        )
    }

    /// Returns `true` for the reduced-precision format the rewriter targets.
    pub fn is_reduced(self) -> bool {
        self == DataType::BFloat16
    }

    /// Short mnemonic used in synthesized node names (`FP32`, `BF16`, ...).
    pub fn mnemonic(self) -> &'static str {
        match self {
            DataType::Float32 => "FP32",
            DataType::BFloat16 => "BF16",
            DataType::Float16 => "FP16",
            DataType::Float64 => "FP64",
            DataType::Int32 => "I32",
            DataType::Int64 => "I64",
            DataType::Bool => "BOOL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Float32 => "float32",
            DataType::BFloat16 => "bfloat16",
            DataType::Float16 => "float16",
            DataType::Float64 => "float64",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}
