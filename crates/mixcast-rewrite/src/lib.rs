//! Precision-conversion graph rewriting.
//!
//! Rewrites a computation graph so that a caller-designated subset of
//! operators runs in bfloat16 while the rest stays in float32, inserting
//! explicit `Cast` operators at every precision boundary. The rewrite is a
//! pure, deterministic transformation: same graph and policy in, same graph
//! out, and running it on its own output changes nothing.

pub mod boundary;
pub mod cast;
pub mod convert;
pub mod error;
pub mod policy;
pub mod retype;

pub use boundary::{find_boundaries, Boundary, CastDirection};
pub use cast::{cast_name, insert_cast, CAST_OP, DST_TYPE_ATTR, SRC_TYPE_ATTR};
pub use convert::{convert, Bf16Converter};
pub use error::{ListKind, RewriteError};
pub use policy::{ConversionPolicy, RewriteMode};
pub use retype::{ensure_convertible, retype, type_attr, NATIVE_TYPE, REDUCED_TYPE};
