//! Cast synthesis and rewiring.
//!
//! Cast node names are derived from the edge they bridge:
//! `<producer>_FP32toBF16` or `<producer>_BF16toFP32`, with the output
//! index spliced in for non-primary outputs (`<producer>_1_BF16toFP32`).
//! The name doubles as the de-duplication key -- all consumers needing the
//! same (producer, output, direction) conversion share one cast, and
//! re-insertion under an existing name reuses the node instead of creating
//! another.

use mixcast_core::{GraphIndex, InputRef, NodeDef};

use crate::boundary::{Boundary, CastDirection};
use crate::error::RewriteError;

/// Operator kind of format-conversion nodes.
pub const CAST_OP: &str = "Cast";
/// Attribute naming the cast's source element type.
pub const SRC_TYPE_ATTR: &str = "SrcT";
/// Attribute naming the cast's destination element type.
pub const DST_TYPE_ATTR: &str = "DstT";

/// Deterministic name of the cast bridging `producer` output `output` in
/// `direction`. The primary output drops its index (`relu2_BF16toFP32`);
/// other outputs keep it (`split_1_BF16toFP32`) so each output bridges
/// through its own cast.
pub fn cast_name(producer: &str, output: u32, direction: CastDirection) -> String {
    if output == 0 {
        format!("{}_{}", producer, direction.suffix())
    } else {
        format!("{}_{}_{}", producer, output, direction.suffix())
    }
}

/// Synthesizes (or reuses) the cast for a boundary and rewires every data
/// input of the consumer that referenced that producer output to read the
/// cast instead. Other outputs of the same producer are untouched.
///
/// Returns the cast's name and whether a new node was created.
pub fn insert_cast(
    index: &mut GraphIndex,
    boundary: &Boundary,
) -> Result<(String, bool), RewriteError> {
    let name = cast_name(&boundary.producer, boundary.output, boundary.direction);
    if boundary.consumer == name {
        return Ok((name, false));
    }
    let edge = InputRef::with_output(boundary.producer.clone(), boundary.output);

    let mut created = false;
    if !index.contains(&name) {
        let cast = NodeDef::new(&name, CAST_OP)
            .with_input_ref(edge.clone())
            .with_attr(SRC_TYPE_ATTR, boundary.direction.src())
            .with_attr(DST_TYPE_ATTR, boundary.direction.dst());
        index.insert_node(cast)?;
        created = true;
    }

    index.redirect_data_edges(&boundary.consumer, &edge, &name)?;
    Ok((name, created))
}
