//! Node definitions.
//!
//! A [`NodeDef`] is identified by its unique name and carries an operator
//! kind (a string tag such as `Conv2D` or `Cast`), an ordered list of input
//! references, and an insertion-ordered bag of typed attributes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::dtype::DataType;
use crate::input::InputRef;

/// A single operator node in a computation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique identity within the graph.
    pub name: String,
    /// Operator kind tag.
    pub op: String,
    /// Ordered producer references. Most nodes have one or two inputs.
    #[serde(default)]
    pub inputs: SmallVec<[InputRef; 2]>,
    /// Named typed attributes, insertion-ordered.
    #[serde(default)]
    pub attrs: IndexMap<String, AttrValue>,
}

impl NodeDef {
    /// Creates a node with no inputs and no attributes.
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        NodeDef {
            name: name.into(),
            op: op.into(),
            inputs: SmallVec::new(),
            attrs: IndexMap::new(),
        }
    }

    /// Builder: appends a data input referencing `producer`'s first output.
    pub fn with_input(mut self, producer: impl Into<String>) -> Self {
        self.inputs.push(InputRef::new(producer));
        self
    }

    /// Builder: appends an arbitrary input reference.
    pub fn with_input_ref(mut self, input: InputRef) -> Self {
        self.inputs.push(input);
        self
    }

    /// Builder: sets a named attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Looks up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Sets or replaces a named attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Looks up a type-tag attribute and returns its element type, if the
    /// attribute exists and is a `Type` value.
    pub fn dtype(&self, attr_name: &str) -> Option<DataType> {
        self.attr(attr_name).and_then(AttrValue::as_type)
    }

    /// Iterates over the data inputs, skipping control references.
    pub fn data_inputs(&self) -> impl Iterator<Item = &InputRef> {
        self.inputs.iter().filter(|r| !r.control)
    }

    /// Returns `true` if any input (data or control) references `producer`.
    pub fn reads_from(&self, producer: &str) -> bool {
        self.inputs.iter().any(|r| r.node == producer)
    }
}
