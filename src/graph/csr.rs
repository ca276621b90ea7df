//! Compressed Sparse Row (CSR) graph representation
//!
//! CSR is optimized for iteration over neighbors, which is exactly what
//! PageRank needs during power iteration. Rows and the edges within each row
//! keep the insertion order of the source [`WeightedGraph`].

use super::builder::WeightedGraph;

/// A directed graph in Compressed Sparse Row format
#[derive(Debug, Clone)]
pub struct CsrGraph {
    /// Number of nodes
    pub num_nodes: usize,
    /// Row pointers: node i's edges are at indices row_ptr[i]..row_ptr[i+1]
    pub row_ptr: Vec<usize>,
    /// Column indices (target nodes) for each edge
    pub col_idx: Vec<u32>,
    /// Edge weights
    pub weights: Vec<f64>,
    /// Total outgoing weight for each node
    pub total_weight: Vec<f64>,
    /// Node keys, indexed by node id
    pub keys: Vec<String>,
}

impl CsrGraph {
    /// Freeze a [`WeightedGraph`] into CSR format
    pub fn from_graph(graph: &WeightedGraph) -> Self {
        let num_nodes = graph.node_count();
        let mut row_ptr = Vec::with_capacity(num_nodes + 1);
        let mut col_idx = Vec::with_capacity(graph.edge_count());
        let mut weights = Vec::with_capacity(graph.edge_count());
        let mut total_weight = Vec::with_capacity(num_nodes);
        let mut keys = Vec::with_capacity(num_nodes);

        row_ptr.push(0);

        for (_, node) in graph.graph_nodes() {
            keys.push(node.key.clone());
            total_weight.push(node.out_weight_sum());

            for &(target, weight) in &node.edges {
                col_idx.push(target);
                weights.push(weight);
            }

            row_ptr.push(col_idx.len());
        }

        Self {
            num_nodes,
            row_ptr,
            col_idx,
            weights,
            total_weight,
            keys,
        }
    }

    /// Iterate over outgoing neighbors of a node
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        let start = self.row_ptr[node as usize];
        let end = self.row_ptr[node as usize + 1];
        (start..end).map(move |i| (self.col_idx[i], self.weights[i]))
    }

    /// Get the total outgoing weight of a node
    pub fn node_total_weight(&self, node: u32) -> f64 {
        self.total_weight[node as usize]
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// Get the total number of directed edges
    pub fn num_edges(&self) -> usize {
        self.col_idx.len()
    }

    /// Find dangling nodes (no outgoing weight to distribute)
    ///
    /// A node whose edges all carry weight 0 is dangling too.
    pub fn dangling_nodes(&self) -> Vec<u32> {
        (0..self.num_nodes as u32)
            .filter(|&n| self.total_weight[n as usize] <= 0.0)
            .collect()
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self {
            num_nodes: 0,
            row_ptr: vec![0],
            col_idx: Vec::new(),
            weights: Vec::new(),
            total_weight: Vec::new(),
            keys: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_graph() -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        graph.set_edge_weight("a", "c", 1.5);
        graph.set_edge_weight("a", "b", 1.0);
        graph.set_edge_weight("b", "c", 2.0);
        graph
    }

    #[test]
    fn test_csr_conversion() {
        let csr = CsrGraph::from_graph(&build_test_graph());

        assert_eq!(csr.num_nodes, 3);
        assert_eq!(csr.keys, vec!["a", "c", "b"]);
        assert_eq!(csr.row_ptr, vec![0, 2, 2, 3]);
    }

    #[test]
    fn test_neighbor_order_is_insertion_order() {
        let csr = CsrGraph::from_graph(&build_test_graph());

        // "a" (id 0) -> "c" (id 1) first, then "b" (id 2)
        let neighbors: Vec<_> = csr.neighbors(0).collect();
        assert_eq!(neighbors, vec![(1, 1.5), (2, 1.0)]);
    }

    #[test]
    fn test_total_weight() {
        let csr = CsrGraph::from_graph(&build_test_graph());

        assert!((csr.node_total_weight(0) - 2.5).abs() < 1e-10);
        assert_eq!(csr.node_total_weight(1), 0.0);
        assert_eq!(csr.neighbors(1).count(), 0);
    }

    #[test]
    fn test_empty_graph() {
        let csr = CsrGraph::from_graph(&WeightedGraph::new());

        assert!(csr.is_empty());
        assert_eq!(csr.num_edges(), 0);
        assert!(csr.dangling_nodes().is_empty());
    }

    #[test]
    fn test_dangling_nodes() {
        let mut graph = WeightedGraph::new();
        graph.set_edge_weight("a", "b", 1.0);
        graph.set_edge_weight("c", "a", 0.0);
        graph.add_node("d");

        let csr = CsrGraph::from_graph(&graph);

        // b has no edges, c only a zero-weight edge, d is isolated
        assert_eq!(csr.dangling_nodes(), vec![1, 2, 3]);
        assert_eq!(csr.keys[2], "c");
    }
}
