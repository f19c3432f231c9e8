//! Operator type-attribute rewriting.
//!
//! Most compute operators tag their element type in a single `T` attribute;
//! retyping a node means overwriting that attribute. Operators with no
//! recognized type attribute (constants, placeholders, casts) cannot be
//! retyped -- the pipeline excludes them from the convert set instead of
//! treating them as errors.

use mixcast_core::{DataType, NodeDef};

use crate::cast::CAST_OP;
use crate::error::RewriteError;

/// The reduced-precision type conversions target.
pub const REDUCED_TYPE: DataType = DataType::BFloat16;
/// The native full-precision type.
pub const NATIVE_TYPE: DataType = DataType::Float32;

/// Returns the name of the primary compute-type attribute for an operator
/// kind, or `None` when the kind has no convertible type attribute.
///
/// Casts carry `SrcT`/`DstT` instead of `T` and are never retyped;
/// constants and placeholders declare their type via `dtype`, which is tied
/// to embedded data and left untouched.
pub fn type_attr(op: &str) -> Option<&'static str> {
    match op {
        "Conv2D" | "Conv3D" | "DepthwiseConv2dNative" | "MatMul" | "BatchMatMul"
        | "BatchMatMulV2" | "AvgPool" | "MaxPool" | "Relu" | "Relu6" | "LeakyRelu" | "BiasAdd"
        | "Add" | "AddV2" | "AddN" | "Sub" | "Mul" | "Maximum" | "Minimum" | "Identity" => {
            Some("T")
        }
        _ => None,
    }
}

/// Checks that a node's operator kind can be retyped.
pub fn ensure_convertible(node: &NodeDef) -> Result<(), RewriteError> {
    if node.op != CAST_OP && type_attr(&node.op).is_some() {
        Ok(())
    } else {
        Err(RewriteError::UnsupportedOperator {
            name: node.name.clone(),
            op: node.op.clone(),
        })
    }
}

/// Overwrites the node's compute-type attribute with `target`.
///
/// Fails with [`RewriteError::UnsupportedOperator`] when the operator kind
/// has no type-attribute mapping.
pub fn retype(node: &mut NodeDef, target: DataType) -> Result<(), RewriteError> {
    ensure_convertible(node)?;
    let attr = type_attr(&node.op).unwrap();
    node.set_attr(attr, target);
    Ok(())
}
