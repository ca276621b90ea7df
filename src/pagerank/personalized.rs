//! Personalized PageRank (PPR) algorithm
//!
//! PPR uses a custom teleport distribution instead of uniform teleportation,
//! biasing the ranking towards trusted seed addresses. The `(1 - damping)`
//! teleport mass is split by the *relative* weights of the personalization
//! vector.

use super::{power_iterate, PageRankResult};
use crate::graph::csr::CsrGraph;
use crate::types::{DanglingPolicy, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, ORACLE_DAMPING};

/// Personalized PageRank implementation
#[derive(Debug, Clone)]
pub struct PersonalizedPageRank {
    /// Damping factor
    pub damping: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Per-node convergence tolerance
    pub tolerance: f64,
    /// Where dangling-node mass goes
    pub dangling: DanglingPolicy,
    /// Personalization vector (bias distribution)
    personalization: Option<Vec<f64>>,
}

impl Default for PersonalizedPageRank {
    fn default() -> Self {
        Self {
            damping: ORACLE_DAMPING,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            dangling: DanglingPolicy::Uniform,
            personalization: None,
        }
    }
}

impl PersonalizedPageRank {
    /// Create a new PersonalizedPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the damping factor
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set the maximum iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the dangling-node policy
    pub fn with_dangling(mut self, dangling: DanglingPolicy) -> Self {
        self.dangling = dangling;
        self
    }

    /// Set the personalization vector (bias distribution)
    ///
    /// The vector should have one entry per node. It will be normalized internally.
    /// Nodes with higher values will be favored during teleportation.
    pub fn with_personalization(mut self, personalization: Vec<f64>) -> Self {
        self.personalization = Some(personalization);
        self
    }

    /// Set personalization from a sparse representation
    ///
    /// Takes a list of (node_id, weight) pairs and the total number of nodes.
    /// Nodes not in the list get weight 0.
    pub fn with_sparse_personalization(mut self, biases: &[(u32, f64)], num_nodes: usize) -> Self {
        let mut personalization = vec![0.0; num_nodes];
        for &(node, weight) in biases {
            if (node as usize) < num_nodes {
                personalization[node as usize] = weight;
            }
        }
        self.personalization = Some(personalization);
        self
    }

    /// Run Personalized PageRank on a graph
    pub fn run(&self, graph: &CsrGraph) -> PageRankResult {
        let n = graph.num_nodes;
        let teleport = self.prepare_personalization(n);
        let dangling_weights = match self.dangling {
            DanglingPolicy::Uniform => vec![1.0 / n as f64; n],
            DanglingPolicy::Personalization => teleport.clone(),
        };

        power_iterate(
            graph,
            self.damping,
            self.max_iterations,
            self.tolerance,
            &teleport,
            &dangling_weights,
        )
    }

    /// Prepare and normalize the personalization vector
    ///
    /// Missing trailing entries count as 0; extra entries are dropped. A
    /// vector summing to 0 falls back to uniform.
    fn prepare_personalization(&self, n: usize) -> Vec<f64> {
        let uniform = || vec![1.0 / n as f64; n];

        match &self.personalization {
            Some(p) => {
                let mut result = vec![0.0; n];
                for (slot, &v) in result.iter_mut().zip(p.iter()) {
                    *slot = v;
                }
                let sum: f64 = result.iter().sum();
                if sum > 0.0 {
                    for v in &mut result {
                        *v /= sum;
                    }
                    result
                } else {
                    uniform()
                }
            }
            // Uniform distribution (classic PageRank)
            None => uniform(),
        }
    }
}
