pub mod attr;
pub mod dtype;
pub mod error;
pub mod graph;
pub mod input;
pub mod node;

// Re-export commonly used types
pub use attr::{AttrValue, TensorValue};
pub use dtype::DataType;
pub use error::CoreError;
pub use graph::{GraphDef, GraphIndex, NodeEntry};
pub use input::InputRef;
pub use node::NodeDef;
