//! The conversion pipeline.
//!
//! [`Bf16Converter`] drives one rewrite invocation through its strict
//! sequence: index the graph, classify nodes against the policy, detect
//! precision boundaries, insert casts and retype converted nodes, then
//! reassemble and validate the final node list. A failure in an early stage
//! aborts before later stages run; list errors surface before any mutation.
//!
//! The converter owns its working copy of the graph, so the caller's graph
//! is never touched and repeated invocations are independent. The index is
//! queryable after `run` for assertions on post-rewrite node state.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use mixcast_core::{GraphDef, GraphIndex};

use crate::boundary::find_boundaries;
use crate::cast::insert_cast;
use crate::error::{ListKind, RewriteError};
use crate::policy::{ConversionPolicy, RewriteMode};
use crate::retype::{ensure_convertible, retype, type_attr, REDUCED_TYPE};

/// Record of a cast created during this invocation, for placement during
/// reassembly.
#[derive(Debug, Clone)]
struct InsertedCast {
    name: String,
    first_consumer: String,
}

/// One precision-conversion rewrite over one graph snapshot.
#[derive(Debug)]
pub struct Bf16Converter {
    index: GraphIndex,
    policy: ConversionPolicy,
    mode: RewriteMode,
    original_order: Vec<String>,
    inserted: Vec<InsertedCast>,
}

impl Bf16Converter {
    /// Indexes the graph and prepares a rewrite with the given policy.
    ///
    /// Fails with a duplicate-name error before anything else happens.
    pub fn new(
        graph: &GraphDef,
        policy: ConversionPolicy,
        mode: RewriteMode,
    ) -> Result<Self, RewriteError> {
        let index = GraphIndex::build(graph)?;
        let original_order = index.names().map(str::to_string).collect();
        Ok(Bf16Converter {
            index,
            policy,
            mode,
            original_order,
            inserted: Vec::new(),
        })
    }

    /// Runs the full rewrite and returns the finalized graph.
    pub fn run(&mut self) -> Result<GraphDef, RewriteError> {
        let convert_set = self.effective_convert_set()?;
        debug!(nodes = convert_set.len(), "classified convert set");

        let boundaries = find_boundaries(&self.index, &convert_set);
        debug!(count = boundaries.len(), "precision boundaries found");

        for b in &boundaries {
            let (name, created) = insert_cast(&mut self.index, b)?;
            if created {
                debug!(cast = %name, consumer = %b.consumer, "inserted cast");
                self.inserted.push(InsertedCast {
                    name,
                    first_consumer: b.consumer.clone(),
                });
            }
        }

        for name in &convert_set {
            let node = &mut self
                .index
                .get_mut(name)
                .expect("convert set verified against index")
                .node;
            retype(node, REDUCED_TYPE)?;
        }

        self.finalize()
    }

    /// Post-rewrite inspection surface: the node arena reflecting all
    /// mutations of this invocation.
    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    /// Computes the effective convert set for the configured mode, dropping
    /// nodes whose operator kind cannot be retyped and nodes whose declared
    /// element type is not floating point.
    fn effective_convert_set(&self) -> Result<IndexSet<String>, RewriteError> {
        let base: IndexSet<String> = match self.mode {
            RewriteMode::Selective => self.policy.classify(&self.index)?,
            RewriteMode::Force => {
                for name in self.policy.deny() {
                    if !self.index.contains(name) {
                        return Err(RewriteError::UnknownListEntry {
                            name: name.clone(),
                            list: ListKind::Deny,
                        });
                    }
                }
                self.index
                    .names()
                    .filter(|name| !self.policy.is_denied(name))
                    .map(str::to_string)
                    .collect()
            }
        };

        let mut set = IndexSet::with_capacity(base.len());
        for name in base {
            let node = &self
                .index
                .get(&name)
                .expect("classify validated names against index")
                .node;
            match ensure_convertible(node) {
                Ok(()) => {
                    // Integer and boolean tensors have no bfloat16 rendition.
                    let attr = type_attr(&node.op).expect("convertible ops have a type attribute");
                    match node.dtype(attr) {
                        Some(declared) if !declared.is_float() => {
                            debug!(node = %name, dtype = %declared, "skipping non-float node");
                        }
                        _ => {
                            set.insert(name);
                        }
                    }
                }
                Err(RewriteError::UnsupportedOperator { name, op }) => {
                    debug!(node = %name, %op, "skipping node with no convertible type attribute");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(set)
    }

    /// Emits the final node list: original nodes in original relative order,
    /// each newly created cast immediately before its first consumer. The
    /// result is validated for input resolution and acyclicity.
    fn finalize(&self) -> Result<GraphDef, RewriteError> {
        self.index.validate()?;

        let mut casts_before: HashMap<&str, Vec<&str>> = HashMap::new();
        for cast in &self.inserted {
            casts_before
                .entry(cast.first_consumer.as_str())
                .or_default()
                .push(cast.name.as_str());
        }

        let mut nodes = Vec::with_capacity(self.index.len());
        for name in &self.original_order {
            if let Some(casts) = casts_before.get(name.as_str()) {
                for cast in casts {
                    nodes.push(self.index.get(cast).expect("inserted cast in index").node.clone());
                }
            }
            nodes.push(self.index.get(name).expect("original node in index").node.clone());
        }

        debug!(nodes = nodes.len(), "graph finalized");
        Ok(GraphDef::from_nodes(nodes))
    }
}

/// Rewrites `graph` so the policy's allow-listed nodes run in bfloat16,
/// inserting casts at every precision boundary.
pub fn convert(
    graph: &GraphDef,
    policy: &ConversionPolicy,
    mode: RewriteMode,
) -> Result<GraphDef, RewriteError> {
    let mut converter = Bf16Converter::new(graph, policy.clone(), mode)?;
    converter.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcast_core::{CoreError, DataType, InputRef, NodeDef};

    fn small_chain() -> GraphDef {
        GraphDef::from_nodes(vec![
            NodeDef::new("input", "Placeholder").with_attr("dtype", DataType::Float32),
            NodeDef::new("weights", "Const").with_attr("dtype", DataType::Float32),
            NodeDef::new("conv", "Conv2D")
                .with_input("input")
                .with_input("weights")
                .with_attr("T", DataType::Float32),
            NodeDef::new("relu", "Relu")
                .with_input("conv")
                .with_attr("T", DataType::Float32),
        ])
    }

    #[test]
    fn converts_allowed_node_and_bridges_both_sides() {
        let policy = ConversionPolicy::new(["conv"], Vec::<String>::new());
        let mut converter =
            Bf16Converter::new(&small_chain(), policy, RewriteMode::Selective).unwrap();
        let out = converter.run().unwrap();

        let conv = &converter.index().get("conv").unwrap().node;
        assert_eq!(conv.dtype("T"), Some(DataType::BFloat16));
        // Both fp32 producers gained casts, and relu reads a cast back to fp32.
        assert!(conv.reads_from("input_FP32toBF16"));
        assert!(conv.reads_from("weights_FP32toBF16"));
        let relu = &converter.index().get("relu").unwrap().node;
        assert!(relu.reads_from("conv_BF16toFP32"));

        // Each cast sits immediately before its first consumer.
        let order: Vec<_> = out.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "input",
                "weights",
                "input_FP32toBF16",
                "weights_FP32toBF16",
                "conv",
                "conv_BF16toFP32",
                "relu",
            ]
        );
    }

    #[test]
    fn unsupported_allowed_node_is_skipped_not_fatal() {
        let policy = ConversionPolicy::new(["weights", "conv"], Vec::<String>::new());
        let out = convert(&small_chain(), &policy, RewriteMode::Selective).unwrap();

        let weights = out.nodes.iter().find(|n| n.name == "weights").unwrap();
        assert_eq!(weights.dtype("dtype"), Some(DataType::Float32));
        // The Const stayed native, so it still needs a cast into conv.
        assert!(out.nodes.iter().any(|n| n.name == "weights_FP32toBF16"));
    }

    #[test]
    fn duplicate_name_aborts_before_rewrite() {
        let mut graph = small_chain();
        graph.push(NodeDef::new("conv", "Conv2D"));
        let err = Bf16Converter::new(
            &graph,
            ConversionPolicy::default(),
            RewriteMode::Selective,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RewriteError::Core(CoreError::DuplicateName { ref name }) if name == "conv"
        ));
    }

    #[test]
    fn unknown_list_entry_aborts_with_no_output() {
        let policy = ConversionPolicy::new(["ghost"], Vec::<String>::new());
        let err = convert(&small_chain(), &policy, RewriteMode::Selective).unwrap_err();
        assert!(matches!(err, RewriteError::UnknownListEntry { .. }));
    }

    #[test]
    fn force_mode_converts_every_supported_op_except_denied() {
        let policy = ConversionPolicy::new(Vec::<String>::new(), ["relu"]);
        let out = convert(&small_chain(), &policy, RewriteMode::Force).unwrap();

        let conv = out.nodes.iter().find(|n| n.name == "conv").unwrap();
        let relu = out.nodes.iter().find(|n| n.name == "relu").unwrap();
        assert_eq!(conv.dtype("T"), Some(DataType::BFloat16));
        assert_eq!(relu.dtype("T"), Some(DataType::Float32));
        assert!(relu.reads_from("conv_BF16toFP32"));
    }

    #[test]
    fn consumers_of_distinct_outputs_keep_their_outputs() {
        let graph = GraphDef::from_nodes(vec![
            NodeDef::new("input", "Placeholder").with_attr("dtype", DataType::Float32),
            NodeDef::new("m", "MatMul")
                .with_input("input")
                .with_attr("T", DataType::Float32),
            NodeDef::new("a", "Relu")
                .with_input("m")
                .with_attr("T", DataType::Float32),
            NodeDef::new("b", "Relu")
                .with_input_ref(InputRef::with_output("m", 1))
                .with_attr("T", DataType::Float32),
        ]);
        let policy = ConversionPolicy::new(["m"], Vec::<String>::new());
        let out = convert(&graph, &policy, RewriteMode::Selective).unwrap();

        let input_of = |name: &str| {
            out.nodes
                .iter()
                .find(|n| n.name == name)
                .unwrap()
                .inputs[0]
                .clone()
        };
        assert_eq!(input_of("a"), InputRef::new("m_BF16toFP32"));
        assert_eq!(input_of("b"), InputRef::new("m_1_BF16toFP32"));
        // Each cast reads the output its consumer originally read.
        assert_eq!(input_of("m_BF16toFP32"), InputRef::new("m"));
        assert_eq!(input_of("m_1_BF16toFP32"), InputRef::with_output("m", 1));

        let twice = convert(&out, &policy, RewriteMode::Selective).unwrap();
        assert_eq!(twice, out);
    }

    #[test]
    fn integer_typed_allowed_node_is_left_alone() {
        let graph = GraphDef::from_nodes(vec![
            NodeDef::new("i", "Placeholder").with_attr("dtype", DataType::Int32),
            NodeDef::new("j", "Placeholder").with_attr("dtype", DataType::Int32),
            NodeDef::new("sum", "Add")
                .with_input("i")
                .with_input("j")
                .with_attr("T", DataType::Int32),
        ]);
        let policy = ConversionPolicy::new(["sum"], Vec::<String>::new());
        let out = convert(&graph, &policy, RewriteMode::Selective).unwrap();

        // An Add is retypable in principle, but not at Int32: the node keeps
        // its type and gains no casts.
        assert_eq!(out, graph);
        let sum = out.nodes.iter().find(|n| n.name == "sum").unwrap();
        assert_eq!(sum.dtype("T"), Some(DataType::Int32));

        // Force mode skips it the same way.
        let forced = convert(&graph, &policy, RewriteMode::Force).unwrap();
        let sum = forced.nodes.iter().find(|n| n.name == "sum").unwrap();
        assert_eq!(sum.dtype("T"), Some(DataType::Int32));
    }

    #[test]
    fn empty_policy_is_identity() {
        let graph = small_chain();
        let out = convert(&graph, &ConversionPolicy::default(), RewriteMode::Selective).unwrap();
        assert_eq!(out, graph);
    }
}
