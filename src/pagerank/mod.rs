//! PageRank algorithms
//!
//! [`personalized::PersonalizedPageRank`] drives the power-iteration kernel
//! below. Without a personalization vector it is classic weighted PageRank
//! with uniform teleportation and uniform dangling redistribution.

pub mod personalized;

use crate::graph::csr::CsrGraph;

/// Result of a PageRank computation
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// Scores for each node (indexed by node ID)
    pub scores: Vec<f64>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final convergence delta (L1 norm of the last update)
    pub delta: f64,
    /// Whether the algorithm converged
    pub converged: bool,
}

impl PageRankResult {
    /// Create a new PageRank result
    pub fn new(scores: Vec<f64>, iterations: usize, delta: f64, converged: bool) -> Self {
        Self {
            scores,
            iterations,
            delta,
            converged,
        }
    }

    /// Sum of all scores (1.0 up to float error for a non-empty graph)
    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }
}

/// Shared power iteration.
///
/// Per iteration, in this order:
/// 1. `dangling_mass = damping * Σ score[d]` over dangling nodes
/// 2. every edge `n -> m` adds `damping * score[n] * (w / out_weight(n))`
/// 3. every node adds `dangling_mass * dangling_weights[i] + (1 - damping) * teleport[i]`
/// 4. `delta = Σ |new - old|`; stop once `delta < tolerance * n`
///
/// The summation order is fixed: truncated scores depend on it.
pub(crate) fn power_iterate(
    graph: &CsrGraph,
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
    teleport: &[f64],
    dangling_weights: &[f64],
) -> PageRankResult {
    let n = graph.num_nodes;
    if n == 0 {
        return PageRankResult::new(vec![], 0, 0.0, true);
    }
    debug_assert_eq!(teleport.len(), n);
    debug_assert_eq!(dangling_weights.len(), n);

    let initial_score = 1.0 / n as f64;
    let mut scores = vec![initial_score; n];
    let mut new_scores = vec![0.0; n];

    let dangling_nodes = graph.dangling_nodes();
    let threshold = tolerance * n as f64;
    let teleport_mass = 1.0 - damping;

    let mut iterations = 0;
    let mut delta = f64::INFINITY;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let dangling_mass: f64 =
            damping * dangling_nodes.iter().map(|&d| scores[d as usize]).sum::<f64>();

        new_scores.fill(0.0);

        // Propagate scores through edges
        for (node, &node_score) in scores.iter().enumerate() {
            let total_weight = graph.node_total_weight(node as u32);

            if total_weight > 0.0 {
                for (neighbor, weight) in graph.neighbors(node as u32) {
                    new_scores[neighbor as usize] += damping * node_score * (weight / total_weight);
                }
            }
        }

        // Dangling redistribution and teleportation
        for (i, score) in new_scores.iter_mut().enumerate() {
            *score += dangling_mass * dangling_weights[i] + teleport_mass * teleport[i];
        }

        // Calculate convergence delta (L1 norm)
        delta = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(old, new)| (new - old).abs())
            .sum();

        // Swap buffers
        std::mem::swap(&mut scores, &mut new_scores);

        if delta < threshold {
            converged = true;
            break;
        }
    }

    PageRankResult::new(scores, iterations, delta, converged)
}
