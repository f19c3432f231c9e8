//! Graph container and the per-invocation index.
//!
//! [`GraphDef`] is the serialized form: an ordered list of nodes wired by
//! name. [`GraphIndex`] is the working form a rewrite operates on: an arena
//! of nodes keyed by name with derived producer/consumer adjacency. The
//! index is rebuilt once per invocation rather than maintained incrementally
//! across invocations; all mutations go through `GraphIndex` methods so the
//! adjacency stays consistent with the node inputs.

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CoreError;
use crate::input::InputRef;
use crate::node::NodeDef;

/// An ordered computation graph, as serialized.
///
/// Node order is meaningful to downstream consumers: producers appear before
/// the nodes that read them once the graph has been finalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    pub nodes: Vec<NodeDef>,
}

impl GraphDef {
    /// Creates an empty graph.
    pub fn new() -> Self {
        GraphDef::default()
    }

    /// Creates a graph from an ordered node list.
    pub fn from_nodes(nodes: Vec<NodeDef>) -> Self {
        GraphDef { nodes }
    }

    /// Appends a node.
    pub fn push(&mut self, node: NodeDef) {
        self.nodes.push(node);
    }

    /// Builds the queryable index for this graph.
    pub fn index(&self) -> Result<GraphIndex, CoreError> {
        GraphIndex::build(self)
    }
}

/// A node plus its derived consumer adjacency.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    /// The node definition, mutated in place during rewriting.
    pub node: NodeDef,
    /// Names of nodes that reference this node in their inputs, in first-seen
    /// order. One entry per consumer even if it reads several outputs.
    pub consumers: Vec<String>,
}

/// Name-keyed arena over a graph's nodes with O(1) lookup in both edge
/// directions: producers of a node are its own `inputs`, consumers are the
/// derived `consumers` list on each entry.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    entries: IndexMap<String, NodeEntry>,
}

impl GraphIndex {
    /// Builds the index from a graph, cloning nodes into the arena.
    ///
    /// Fails with [`CoreError::DuplicateName`] if two nodes share a name.
    /// Dangling input references are tolerated at build time so that a
    /// structurally broken graph can still be inspected; [`validate`]
    /// (Self::validate) reports them.
    pub fn build(graph: &GraphDef) -> Result<Self, CoreError> {
        let mut entries: IndexMap<String, NodeEntry> = IndexMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            let entry = NodeEntry {
                node: node.clone(),
                consumers: Vec::new(),
            };
            if entries.insert(node.name.clone(), entry).is_some() {
                return Err(CoreError::DuplicateName {
                    name: node.name.clone(),
                });
            }
        }

        // Derive consumer adjacency from the input lists.
        for node in &graph.nodes {
            for input in &node.inputs {
                if let Some(producer) = entries.get_mut(&input.node) {
                    if !producer.consumers.iter().any(|c| c == &node.name) {
                        producer.consumers.push(node.name.clone());
                    }
                }
            }
        }

        Ok(GraphIndex { entries })
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a node with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up a node entry by name.
    pub fn get(&self, name: &str) -> Option<&NodeEntry> {
        self.entries.get(name)
    }

    /// Looks up a node entry by name (mutable).
    pub fn get_mut(&mut self, name: &str) -> Option<&mut NodeEntry> {
        self.entries.get_mut(name)
    }

    /// Iterates node names in arena order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates `(name, entry)` pairs in arena order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &NodeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of the nodes consuming `name`, in first-seen order.
    pub fn consumers_of(&self, name: &str) -> &[String] {
        self.entries
            .get(name)
            .map(|e| e.consumers.as_slice())
            .unwrap_or(&[])
    }

    /// Producer names read by `name`, in input order (control refs included).
    pub fn producers_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(name)
            .into_iter()
            .flat_map(|e| e.node.inputs.iter().map(|r| r.node.as_str()))
    }

    /// Inserts a new node into the arena, registering it as a consumer of
    /// each of its producers.
    ///
    /// Fails with [`CoreError::DuplicateName`] if the name is taken, or
    /// [`CoreError::UnknownNode`] if an input references a node that does not
    /// exist.
    pub fn insert_node(&mut self, node: NodeDef) -> Result<(), CoreError> {
        if self.entries.contains_key(&node.name) {
            return Err(CoreError::DuplicateName { name: node.name });
        }
        for input in &node.inputs {
            if !self.entries.contains_key(&input.node) {
                return Err(CoreError::UnknownNode {
                    name: input.node.clone(),
                });
            }
        }

        let name = node.name.clone();
        for input in node.inputs.clone() {
            let producer = self.entries.get_mut(&input.node).unwrap();
            if !producer.consumers.iter().any(|c| c == &name) {
                producer.consumers.push(name.clone());
            }
        }
        self.entries.insert(
            name,
            NodeEntry {
                node,
                consumers: Vec::new(),
            },
        );
        Ok(())
    }

    /// Redirects every data input of `consumer` that references the exact
    /// producer output named by `from` to reference the primary output of
    /// `to` instead, keeping adjacency consistent on both producers. Control
    /// references and references to other outputs of the same producer are
    /// left alone.
    ///
    /// Returns the number of input slots rewired.
    pub fn redirect_data_edges(
        &mut self,
        consumer: &str,
        from: &InputRef,
        to: &str,
    ) -> Result<usize, CoreError> {
        if !self.entries.contains_key(to) {
            return Err(CoreError::UnknownNode {
                name: to.to_string(),
            });
        }
        let entry = self
            .entries
            .get_mut(consumer)
            .ok_or_else(|| CoreError::UnknownNode {
                name: consumer.to_string(),
            })?;

        let mut rewired = 0;
        for input in entry.node.inputs.iter_mut() {
            if !input.control && input.node == from.node && input.output == from.output {
                *input = input.redirected(to);
                rewired += 1;
            }
        }
        if rewired == 0 {
            return Ok(0);
        }
        let still_reads_from = entry.node.reads_from(&from.node);

        if !still_reads_from {
            if let Some(old) = self.entries.get_mut(&from.node) {
                old.consumers.retain(|c| c != consumer);
            }
        }
        let new_producer = self.entries.get_mut(to).unwrap();
        if !new_producer.consumers.iter().any(|c| c == consumer) {
            new_producer.consumers.push(consumer.to_string());
        }
        Ok(rewired)
    }

    /// Checks that every input reference resolves and that the dependency
    /// relation is acyclic.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, entry) in &self.entries {
            for input in &entry.node.inputs {
                if !self.entries.contains_key(&input.node) {
                    return Err(CoreError::UnresolvedInput {
                        node: name.clone(),
                        input: input.to_string(),
                    });
                }
            }
        }

        // Acyclicity via toposort over the derived dependency graph.
        let mut dep: DiGraph<&str, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.entries.len());
        for name in self.entries.keys() {
            indices.insert(name.as_str(), dep.add_node(name.as_str()));
        }
        for (name, entry) in &self.entries {
            for input in &entry.node.inputs {
                dep.add_edge(indices[input.node.as_str()], indices[name.as_str()], ());
            }
        }
        if let Err(cycle) = toposort(&dep, None) {
            return Err(CoreError::GraphCycle {
                node: dep[cycle.node_id()].to_string(),
            });
        }
        Ok(())
    }
}
