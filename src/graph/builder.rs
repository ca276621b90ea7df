//! Weighted attestation graph
//!
//! A mutable directed graph keyed by node identifier. Nodes live in a `Vec`
//! in first-seen order and an FxHashMap maps keys to ids, so every traversal
//! (and therefore every floating-point summation downstream) follows
//! insertion order rather than hash order.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::errors::Result;
use crate::quantize::Quantizer;

/// A node in the weighted graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// The node identifier (an address in the attestation domain)
    pub key: String,
    /// Outgoing edges in first-insertion order: (target id, weight)
    pub edges: Vec<(u32, f64)>,
    /// Target id -> position in `edges`
    edge_index: FxHashMap<u32, usize>,
}

impl GraphNode {
    /// Create a new node with no outgoing edges
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            edges: Vec::new(),
            edge_index: FxHashMap::default(),
        }
    }

    /// Sum of outgoing edge weights
    pub fn out_weight_sum(&self) -> f64 {
        self.edges.iter().map(|&(_, w)| w).sum()
    }

    fn set_edge(&mut self, target: u32, weight: f64) {
        match self.edge_index.get(&target) {
            Some(&pos) => self.edges[pos].1 = weight,
            None => {
                self.edge_index.insert(target, self.edges.len());
                self.edges.push((target, weight));
            }
        }
    }
}

/// Directed weighted graph where each (source, target) pair holds one weight
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    /// Maps key -> node id
    key_to_id: FxHashMap<String, u32>,
    /// Node storage, indexed by id
    nodes: Vec<GraphNode>,
}

/// Serializable summary of a graph's contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphInfo {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String, f64)>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl WeightedGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with pre-allocated node capacity
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            key_to_id: FxHashMap::with_capacity_and_hasher(node_capacity, Default::default()),
            nodes: Vec::with_capacity(node_capacity),
        }
    }

    /// Insert a node if absent, returning its id. Idempotent.
    pub fn add_node(&mut self, key: &str) -> u32 {
        if let Some(&id) = self.key_to_id.get(key) {
            return id;
        }

        let id = self.nodes.len() as u32;
        self.key_to_id.insert(key.to_string(), id);
        self.nodes.push(GraphNode::new(key));
        id
    }

    /// Add or overwrite the edge `source -> target` with weight
    /// `integer_weight / scale`.
    ///
    /// Both endpoints are added as nodes, source first. Fails only when
    /// `scale` is zero; no other validation is applied.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        integer_weight: u64,
        scale: u64,
    ) -> Result<()> {
        let weight = Quantizer::new(scale)?.to_unit(integer_weight);
        self.set_edge_weight(source, target, weight);
        Ok(())
    }

    /// Add or overwrite the edge `source -> target` with a unit weight.
    pub fn set_edge_weight(&mut self, source: &str, target: &str, weight: f64) {
        let from = self.add_node(source);
        let to = self.add_node(target);
        self.nodes[from as usize].set_edge(to, weight);
    }

    /// Sum of weights on edges leaving `key`; 0 for dangling or unknown nodes.
    pub fn out_weight_sum(&self, key: &str) -> f64 {
        self.get_node_id(key)
            .and_then(|id| self.nodes.get(id as usize))
            .map_or(0.0, GraphNode::out_weight_sum)
    }

    /// Weight of `source -> target`, if that edge exists
    pub fn edge_weight(&self, source: &str, target: &str) -> Option<f64> {
        let from = self.get_node_id(source)?;
        let to = self.get_node_id(target)?;
        let node = &self.nodes[from as usize];
        node.edge_index.get(&to).map(|&pos| node.edges[pos].1)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of directed edges
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Check whether a node exists
    pub fn contains_node(&self, key: &str) -> bool {
        self.key_to_id.contains_key(key)
    }

    /// Get a node id by key
    pub fn get_node_id(&self, key: &str) -> Option<u32> {
        self.key_to_id.get(key).copied()
    }

    /// Iterate over node keys in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.key.as_str())
    }

    /// Iterate over nodes with their ids
    pub fn graph_nodes(&self) -> impl Iterator<Item = (u32, &GraphNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as u32, n))
    }

    /// Iterate over `(source, target, weight)` triples, grouped by source in
    /// node order, then in edge first-insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.nodes.iter().flat_map(move |node| {
            node.edges
                .iter()
                .map(move |&(to, w)| (node.key.as_str(), self.nodes[to as usize].key.as_str(), w))
        })
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot the graph contents
    pub fn info(&self) -> GraphInfo {
        GraphInfo {
            nodes: self.nodes().map(str::to_string).collect(),
            edges: self
                .edges()
                .map(|(s, t, w)| (s.to_string(), t.to_string(), w))
                .collect(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
        }
    }
}
