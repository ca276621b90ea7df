//! Ranking engine
//!
//! [`RankEngine`] takes ownership of a freshly built [`WeightedGraph`],
//! validates its [`RankConfig`], resolves the keyed personalization vector
//! onto node ids and runs the power iteration. The graph is consumed: every
//! ranking pass works on its own graph.

use crate::errors::{RankError, Result};
use crate::graph::builder::WeightedGraph;
use crate::graph::csr::CsrGraph;
use crate::pagerank::personalized::PersonalizedPageRank;
use crate::pagerank::PageRankResult;
use crate::quantize::Quantizer;
use crate::scores::{QuantizedScores, RankedScores};
use crate::types::RankConfig;

/// PageRank engine over weighted attestation graphs
#[derive(Debug, Clone, Default)]
pub struct RankEngine {
    config: RankConfig,
    personalization: Option<Vec<(String, f64)>>,
}

impl RankEngine {
    /// Create an engine; the config is validated when ranking.
    pub fn new(config: RankConfig) -> Self {
        Self {
            config,
            personalization: None,
        }
    }

    /// Bias teleportation towards the given nodes.
    ///
    /// Weights are relative: they are normalized over the nodes present in
    /// the ranked graph. Graph nodes without an entry get weight 0; entries
    /// for keys outside the graph are ignored.
    pub fn with_personalization<K, I>(mut self, personalization: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        self.personalization = Some(
            personalization
                .into_iter()
                .map(|(k, w)| (k.into(), w))
                .collect(),
        );
        self
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Rank every node of `graph`.
    ///
    /// Hitting `max_iterations` is not an error; inspect
    /// [`RankedScores::converged`] and [`RankedScores::iterations`].
    pub fn rank(&self, graph: WeightedGraph) -> Result<RankedScores> {
        self.config.validate()?;
        self.validate_personalization()?;

        if graph.is_empty() {
            return Ok(RankedScores::empty());
        }

        let csr = CsrGraph::from_graph(&graph);
        let result = self.run(&csr, &graph);

        #[cfg(feature = "tracing")]
        {
            if result.converged {
                tracing::debug!(
                    nodes = csr.num_nodes,
                    edges = csr.num_edges(),
                    iterations = result.iterations,
                    delta = result.delta,
                    "pagerank converged"
                );
            } else {
                tracing::warn!(
                    nodes = csr.num_nodes,
                    iterations = result.iterations,
                    delta = result.delta,
                    threshold = self.config.tolerance * csr.num_nodes as f64,
                    "pagerank reached max_iterations without converging"
                );
            }
        }

        let PageRankResult {
            scores,
            iterations,
            delta,
            converged,
        } = result;
        let entries = csr.keys.into_iter().zip(scores).collect();

        Ok(RankedScores::new(entries, iterations, delta, converged))
    }

    /// Rank and truncate onto the configured scale.
    pub fn rank_quantized(&self, graph: WeightedGraph) -> Result<QuantizedScores> {
        let quantizer = Quantizer::new(self.config.scale)?;
        Ok(self.rank(graph)?.quantize(&quantizer))
    }

    fn run(&self, csr: &CsrGraph, graph: &WeightedGraph) -> PageRankResult {
        let pagerank = PersonalizedPageRank::new()
            .with_damping(self.config.damping)
            .with_max_iterations(self.config.max_iterations)
            .with_tolerance(self.config.tolerance)
            .with_dangling(self.config.dangling);

        let Some(personalization) = &self.personalization else {
            return pagerank.run(csr);
        };

        let biases: Vec<(u32, f64)> = personalization
            .iter()
            .filter_map(|(key, weight)| {
                let id = graph.get_node_id(key);
                #[cfg(feature = "tracing")]
                if id.is_none() {
                    tracing::debug!(node = %key, "personalization key not in graph, ignored");
                }
                id.map(|id| (id, *weight))
            })
            .collect();

        pagerank
            .with_sparse_personalization(&biases, csr.num_nodes)
            .run(csr)
    }

    fn validate_personalization(&self) -> Result<()> {
        let Some(personalization) = &self.personalization else {
            return Ok(());
        };
        match personalization
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            Some((node, weight)) => Err(RankError::InvalidPersonalization {
                node: node.clone(),
                weight: *weight,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DanglingPolicy;

    fn two_node_graph(weight: u64) -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        graph.add_edge("0x1111", "0x2222", weight, 1_000_000).unwrap();
        graph
    }

    fn dangling_graph() -> WeightedGraph {
        // a -> b, b dangling, c isolated
        let mut graph = WeightedGraph::new();
        graph.set_edge_weight("a", "b", 0.5);
        graph.add_node("c");
        graph
    }

    #[test]
    fn test_empty_graph_returns_empty_map() {
        let scores = RankEngine::default().rank(WeightedGraph::new()).unwrap();

        assert!(scores.is_empty());
        assert!(scores.converged);
        assert_eq!(scores.iterations, 0);
    }

    #[test]
    fn test_single_node_gets_full_scale() {
        let mut graph = WeightedGraph::new();
        graph.add_node("0x1111");

        let engine = RankEngine::new(RankConfig::oracle());
        let raw = engine.rank(graph.clone()).unwrap();
        assert_eq!(raw.get("0x1111"), Some(1.0));

        let quantized = engine.rank_quantized(graph).unwrap();
        assert_eq!(quantized.get("0x1111"), Some(1_000_000));
    }

    #[test]
    fn test_mass_conservation_with_dangling_node() {
        for config in [RankConfig::oracle(), RankConfig::calculator()] {
            let scores = RankEngine::new(config).rank(dangling_graph()).unwrap();

            assert!(scores.converged);
            assert!((scores.total() - 1.0).abs() < 1e-9);
            assert!(scores.get("b").unwrap() > scores.get("a").unwrap());
            assert_eq!(scores.get("a"), scores.get("c"));
        }
    }

    #[test]
    fn test_weight_monotonicity() {
        for config in [RankConfig::oracle(), RankConfig::calculator()] {
            let engine = RankEngine::new(config);
            let high = engine.rank_quantized(two_node_graph(800_000)).unwrap();
            let low = engine.rank_quantized(two_node_graph(400_000)).unwrap();

            assert!(high.get("0x2222").unwrap() >= low.get("0x2222").unwrap());
        }
    }

    #[test]
    fn test_two_node_reference_values() {
        let oracle = RankEngine::new(RankConfig::oracle())
            .rank_quantized(two_node_graph(800_000))
            .unwrap();
        assert_eq!(oracle.get("0x1111"), Some(350_877));
        assert_eq!(oracle.get("0x2222"), Some(649_122));

        let calculator = RankEngine::new(RankConfig::calculator())
            .rank_quantized(two_node_graph(900_000))
            .unwrap();
        assert_eq!(calculator.get("0x1111"), Some(370_370));
        assert_eq!(calculator.get("0x2222"), Some(629_629));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let graph = two_node_graph(500_000);

        let err = RankEngine::new(RankConfig::oracle().with_damping(1.0))
            .rank(graph.clone())
            .unwrap_err();
        assert!(matches!(err, RankError::InvalidDamping(_)));

        let err = RankEngine::new(RankConfig::oracle().with_scale(0))
            .rank_quantized(graph)
            .unwrap_err();
        assert!(matches!(err, RankError::InvalidScale(0)));
    }

    #[test]
    fn test_invalid_personalization_rejected() {
        let err = RankEngine::default()
            .with_personalization([("a", 1.0), ("b", -0.5)])
            .rank(dangling_graph())
            .unwrap_err();

        assert!(matches!(err, RankError::InvalidPersonalization { ref node, .. } if node == "b"));
    }

    #[test]
    fn test_personalization_by_key() {
        let mut graph = WeightedGraph::new();
        graph.set_edge_weight("a", "b", 1.0);
        graph.set_edge_weight("b", "c", 1.0);

        let scores = RankEngine::default()
            .with_personalization([("a", 1.0), ("not-in-graph", 50.0)])
            .rank_quantized(graph)
            .unwrap();

        assert_eq!(
            scores.iter().collect::<Vec<_>>(),
            vec![("a", 263_255), ("b", 337_021), ("c", 399_723)]
        );
    }

    #[test]
    fn test_non_convergence_is_reported_not_raised() {
        let config = RankConfig::oracle().with_max_iterations(2).with_tolerance(0.0);
        let scores = RankEngine::new(config).rank(dangling_graph()).unwrap();

        assert!(!scores.converged);
        assert_eq!(scores.iterations, 2);
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn test_dangling_policy_changes_result() {
        let mut graph = WeightedGraph::new();
        graph.set_edge_weight("a", "b", 1.0);
        graph.set_edge_weight("b", "c", 1.0);

        let scores = RankEngine::new(RankConfig::oracle().with_dangling(DanglingPolicy::Personalization))
            .with_personalization([("a", 1.0)])
            .rank_quantized(graph)
            .unwrap();

        assert_eq!(
            scores.iter().collect::<Vec<_>>(),
            vec![("a", 388_727), ("b", 330_417), ("c", 280_855)]
        );
    }
}
