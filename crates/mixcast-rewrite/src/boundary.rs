//! Precision-boundary detection.
//!
//! A boundary is a producer→consumer edge where exactly one endpoint is in
//! the convert set. Detection runs on set membership, not on current
//! attribute values, and skips edges that an existing cast already bridges
//! so that re-running the rewrite on its own output inserts nothing.

use indexmap::IndexSet;

use mixcast_core::{DataType, GraphIndex};

use crate::cast::{cast_name, CAST_OP, DST_TYPE_ATTR};

/// Direction of the numeric-format conversion a boundary needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastDirection {
    /// Native producer feeding a reduced-precision consumer.
    ToReduced,
    /// Reduced-precision producer feeding a native consumer.
    ToNative,
}

impl CastDirection {
    /// Element type on the producer side of the cast.
    pub fn src(self) -> DataType {
        match self {
            CastDirection::ToReduced => DataType::Float32,
            CastDirection::ToNative => DataType::BFloat16,
        }
    }

    /// Element type on the consumer side of the cast.
    pub fn dst(self) -> DataType {
        match self {
            CastDirection::ToReduced => DataType::BFloat16,
            CastDirection::ToNative => DataType::Float32,
        }
    }

    /// Name suffix for synthesized cast nodes, e.g. `FP32toBF16`.
    pub fn suffix(self) -> String {
        format!("{}to{}", self.src().mnemonic(), self.dst().mnemonic())
    }
}

/// One edge crossing a precision boundary. The producer output matters:
/// different outputs of one producer carry different values and bridge
/// through different casts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub producer: String,
    pub output: u32,
    pub consumer: String,
    pub direction: CastDirection,
}

/// Walks every edge and collects the boundaries needing a cast, in arena
/// order of the consumer (then input order).
///
/// Edges where both endpoints share a precision domain are skipped, as are
/// control edges (no value flows) and edges already bridged: either the
/// producer is a cast whose destination type matches the needed direction,
/// or the consumer *is* the deterministic cast for this producer and
/// direction.
pub fn find_boundaries(index: &GraphIndex, convert_set: &IndexSet<String>) -> Vec<Boundary> {
    let mut boundaries = Vec::new();

    for (consumer, entry) in index.entries() {
        let consumer_converted = convert_set.contains(consumer);

        for input in entry.node.data_inputs() {
            let producer = input.node.as_str();
            let producer_converted = convert_set.contains(producer);
            if producer_converted == consumer_converted {
                continue;
            }
            let direction = if producer_converted {
                CastDirection::ToNative
            } else {
                CastDirection::ToReduced
            };

            if let Some(producer_entry) = index.get(producer) {
                let already_bridged = producer_entry.node.op == CAST_OP
                    && producer_entry.node.dtype(DST_TYPE_ATTR) == Some(direction.dst());
                if already_bridged {
                    continue;
                }
            }
            if consumer == cast_name(producer, input.output, direction) {
                continue;
            }

            boundaries.push(Boundary {
                producer: producer.to_string(),
                output: input.output,
                consumer: consumer.to_string(),
                direction,
            });
        }
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcast_core::{GraphDef, InputRef, NodeDef};

    fn convert_set(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn simple_chain() -> GraphIndex {
        GraphDef::from_nodes(vec![
            NodeDef::new("input", "Placeholder").with_attr("dtype", DataType::Float32),
            NodeDef::new("conv1", "Conv2D")
                .with_input("input")
                .with_attr("T", DataType::Float32),
            NodeDef::new("relu1", "Relu")
                .with_input("conv1")
                .with_attr("T", DataType::Float32),
        ])
        .index()
        .unwrap()
    }

    #[test]
    fn emits_both_directions_around_converted_node() {
        let index = simple_chain();
        let boundaries = find_boundaries(&index, &convert_set(&["conv1"]));
        assert_eq!(
            boundaries,
            vec![
                Boundary {
                    producer: "input".into(),
                    output: 0,
                    consumer: "conv1".into(),
                    direction: CastDirection::ToReduced,
                },
                Boundary {
                    producer: "conv1".into(),
                    output: 0,
                    consumer: "relu1".into(),
                    direction: CastDirection::ToNative,
                },
            ]
        );
    }

    #[test]
    fn same_domain_edges_are_skipped() {
        let index = simple_chain();
        assert!(find_boundaries(&index, &convert_set(&[])).is_empty());

        let boundaries = find_boundaries(&index, &convert_set(&["conv1", "relu1"]));
        // Only the edge into conv1 crosses; conv1 -> relu1 stays internal.
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].consumer, "conv1");
    }

    #[test]
    fn control_edges_never_cross() {
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("init", "NoOp"),
            NodeDef::new("conv1", "Conv2D")
                .with_input_ref(InputRef::control("init"))
                .with_attr("T", DataType::Float32),
        ])
        .index()
        .unwrap();

        assert!(find_boundaries(&index, &convert_set(&["conv1"])).is_empty());
    }

    #[test]
    fn edge_from_bridging_cast_is_skipped() {
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("input", "Placeholder").with_attr("dtype", DataType::Float32),
            NodeDef::new("input_FP32toBF16", "Cast")
                .with_input("input")
                .with_attr("SrcT", DataType::Float32)
                .with_attr("DstT", DataType::BFloat16),
            NodeDef::new("conv1", "Conv2D")
                .with_input("input_FP32toBF16")
                .with_attr("T", DataType::BFloat16),
        ])
        .index()
        .unwrap();

        // conv1 is converted, its producer is a cast already emitting bf16.
        assert!(find_boundaries(&index, &convert_set(&["conv1"])).is_empty());
    }

    #[test]
    fn each_producer_output_crosses_separately() {
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("m", "MatMul").with_attr("T", DataType::BFloat16),
            NodeDef::new("a", "Relu")
                .with_input("m")
                .with_attr("T", DataType::Float32),
            NodeDef::new("b", "Relu")
                .with_input_ref(InputRef::with_output("m", 1))
                .with_attr("T", DataType::Float32),
        ])
        .index()
        .unwrap();

        let boundaries = find_boundaries(&index, &convert_set(&["m"]));
        assert_eq!(boundaries.len(), 2);
        assert_eq!((boundaries[0].consumer.as_str(), boundaries[0].output), ("a", 0));
        assert_eq!((boundaries[1].consumer.as_str(), boundaries[1].output), ("b", 1));
    }

    #[test]
    fn edge_into_own_cast_for_nonzero_output_is_skipped() {
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("m", "MatMul").with_attr("T", DataType::BFloat16),
            NodeDef::new("m_1_BF16toFP32", "Cast")
                .with_input_ref(InputRef::with_output("m", 1))
                .with_attr("SrcT", DataType::BFloat16)
                .with_attr("DstT", DataType::Float32),
        ])
        .index()
        .unwrap();

        assert!(find_boundaries(&index, &convert_set(&["m"])).is_empty());
    }

    #[test]
    fn edge_into_own_deterministic_cast_is_skipped() {
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("relu2", "Relu").with_attr("T", DataType::BFloat16),
            NodeDef::new("relu2_BF16toFP32", "Cast")
                .with_input("relu2")
                .with_attr("SrcT", DataType::BFloat16)
                .with_attr("DstT", DataType::Float32),
            NodeDef::new("conv3", "Conv2D")
                .with_input("relu2_BF16toFP32")
                .with_attr("T", DataType::Float32),
        ])
        .index()
        .unwrap();

        assert!(find_boundaries(&index, &convert_set(&["relu2"])).is_empty());
    }

    #[test]
    fn hand_written_cast_with_matching_destination_counts_as_bridge() {
        // A pre-existing cast with a non-deterministic name still bridges the
        // edge when its destination type matches.
        let index = GraphDef::from_nodes(vec![
            NodeDef::new("bias_add", "BiasAdd").with_attr("T", DataType::Float32),
            NodeDef::new("cast", "Cast")
                .with_input("bias_add")
                .with_attr("SrcT", DataType::Float32)
                .with_attr("DstT", DataType::BFloat16),
            NodeDef::new("relu", "Relu")
                .with_input("cast")
                .with_attr("T", DataType::BFloat16),
        ])
        .index()
        .unwrap();

        assert!(find_boundaries(&index, &convert_set(&["relu"])).is_empty());
    }

    #[test]
    fn direction_types_and_suffixes() {
        assert_eq!(CastDirection::ToReduced.src(), DataType::Float32);
        assert_eq!(CastDirection::ToReduced.dst(), DataType::BFloat16);
        assert_eq!(CastDirection::ToReduced.suffix(), "FP32toBF16");
        assert_eq!(CastDirection::ToNative.suffix(), "BF16toFP32");
    }
}
