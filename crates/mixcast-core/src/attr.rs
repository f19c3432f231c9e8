//! Typed attribute values attached to graph nodes.
//!
//! Every node carries an insertion-ordered bag of named attributes. Rather
//! than an untyped dictionary, [`AttrValue`] is a tagged union with explicit
//! typed accessors, so passes that rewrite one kind of attribute (the
//! numeric-type tag, say) cannot silently misread another.

use serde::{Deserialize, Serialize};

use crate::dtype::DataType;

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// A numeric element type tag (e.g. the `T` attribute on compute ops).
    Type(DataType),
    /// A scalar integer.
    Int(i64),
    /// A scalar float.
    Float(f64),
    /// A boolean flag.
    Bool(bool),
    /// A short string (e.g. padding mode, data format).
    Str(String),
    /// An opaque byte string.
    Bytes(Vec<u8>),
    /// A list of integers (e.g. strides, dilations).
    IntList(Vec<i64>),
    /// A tensor shape, one extent per dimension (`-1` = unknown).
    Shape(Vec<i64>),
    /// An embedded constant tensor.
    Tensor(TensorValue),
}

/// An embedded constant tensor: element type, shape, and raw little-endian
/// element bytes. The rewriter never interprets the bytes; they ride along
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorValue {
    pub dtype: DataType,
    pub shape: Vec<i64>,
    pub data: Vec<u8>,
}

impl AttrValue {
    /// Returns the element type if this is a `Type` attribute.
    pub fn as_type(&self) -> Option<DataType> {
        match self {
            AttrValue::Type(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the integer value if this is an `Int` attribute.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a `Str` attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte string if this is a `Bytes` attribute.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the integer list if this is an `IntList` attribute.
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            AttrValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the shape if this is a `Shape` attribute.
    pub fn as_shape(&self) -> Option<&[i64]> {
        match self {
            AttrValue::Shape(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the tensor if this is a `Tensor` attribute.
    pub fn as_tensor(&self) -> Option<&TensorValue> {
        match self {
            AttrValue::Tensor(t) => Some(t),
            _ => None,
        }
    }
}

impl From<DataType> for AttrValue {
    fn from(t: DataType) -> Self {
        AttrValue::Type(t)
    }
}
