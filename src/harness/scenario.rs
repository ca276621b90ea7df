//! Comparison scenarios.
//!
//! A [`Scenario`] is a named family of graphs. It expands into one or more
//! [`ScenarioCase`]s (plain node and edge lists) that every score producer
//! ranks independently, and may carry a property its case results must
//! satisfy regardless of how close two producers are to each other.
//!
//! Suites are plain JSON:
//!
//! ```json
//! [
//!   {"kind": "basic"},
//!   {"kind": "weight_sensitivity", "high": 800000, "low": 400000},
//!   {"kind": "cycle", "size": 5, "weight": 500000}
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::graph::builder::WeightedGraph;
use crate::scores::QuantizedScores;
use crate::types::AttestationData;

/// Node whose score the weight-sensitivity scenario tracks
const SENSITIVITY_TARGET: &str = "0x2222";

// ─── Cases ──────────────────────────────────────────────────────────────────

/// One directed edge with an integer weight on the configured scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

impl CaseEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: u64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// A concrete graph every producer ranks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioCase {
    pub name: String,
    /// Nodes added before any edge, fixing their order and allowing isolates
    pub nodes: Vec<String>,
    pub edges: Vec<CaseEdge>,
}

impl ScenarioCase {
    pub fn new(name: impl Into<String>, nodes: Vec<String>, edges: Vec<CaseEdge>) -> Self {
        Self {
            name: name.into(),
            nodes,
            edges,
        }
    }

    /// Build a fresh graph for this case
    pub fn build_graph(&self, scale: u64) -> Result<WeightedGraph> {
        let mut graph = WeightedGraph::with_capacity(self.nodes.len() + self.edges.len());
        for node in &self.nodes {
            graph.add_node(node);
        }
        for edge in &self.edges {
            graph.add_edge(&edge.source, &edge.target, edge.weight, scale)?;
        }
        Ok(graph)
    }
}

// ─── Scenario ───────────────────────────────────────────────────────────────

/// A named family of comparison graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scenario {
    /// `0x1111` attests `0x2222` (0.8) and `0x3333` (0.4)
    Basic,
    /// The same single edge `0x1111 -> 0x2222` at two weights
    WeightSensitivity { high: u64, low: u64 },
    /// A directed ring of `size` nodes with equal weights
    Cycle { size: usize, weight: u64 },
    SingleNode,
    /// Two attesters pointing at a node with no outgoing edges
    Dangling,
    /// `size` nodes and no edges
    Disconnected { size: usize },
    /// An attestation export, ingested the way the oracle does
    Attestations { name: String, data: AttestationData },
    /// An arbitrary edge list
    Edges {
        name: String,
        #[serde(default)]
        nodes: Vec<String>,
        edges: Vec<CaseEdge>,
    },
}

impl Scenario {
    /// Suite covering the reference behaviours: basic ranking, weight
    /// sensitivity, symmetry, dangling mass, isolates and attestation ingest.
    pub fn default_suite() -> Vec<Scenario> {
        vec![
            Scenario::Basic,
            Scenario::WeightSensitivity {
                high: 800_000,
                low: 400_000,
            },
            Scenario::Cycle {
                size: 5,
                weight: 500_000,
            },
            Scenario::SingleNode,
            Scenario::Dangling,
            Scenario::Disconnected { size: 4 },
            Scenario::Attestations {
                name: "attestation_network".to_string(),
                data: AttestationData {
                    borrowers: vec!["0x2222".into(), "0x3333".into(), "0x4444".into()],
                    attesters: vec![
                        vec!["0x1111".into(), "0x5555".into()],
                        vec!["0x1111".into(), "0x6666".into()],
                        vec!["0x2222".into(), "0x7777".into()],
                    ],
                    weights: vec![
                        vec![800_000, 600_000],
                        vec![400_000, 900_000],
                        vec![700_000, 500_000],
                    ],
                },
            },
        ]
    }

    /// Parse a JSON array of scenarios
    pub fn suite_from_json_str(json: &str) -> Result<Vec<Scenario>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn name(&self) -> String {
        match self {
            Scenario::Basic => "basic".to_string(),
            Scenario::WeightSensitivity { .. } => "weight_sensitivity".to_string(),
            Scenario::Cycle { size, .. } => format!("cycle_{size}"),
            Scenario::SingleNode => "single_node".to_string(),
            Scenario::Dangling => "dangling".to_string(),
            Scenario::Disconnected { size } => format!("disconnected_{size}"),
            Scenario::Attestations { name, .. } | Scenario::Edges { name, .. } => name.clone(),
        }
    }

    /// Expand into concrete cases; case names are unique within a suite as
    /// long as scenario names are.
    pub fn cases(&self) -> Vec<ScenarioCase> {
        let name = self.name();
        match self {
            Scenario::Basic => vec![ScenarioCase::new(
                name,
                Vec::new(),
                vec![
                    CaseEdge::new("0x1111", "0x2222", 800_000),
                    CaseEdge::new("0x1111", "0x3333", 400_000),
                ],
            )],
            Scenario::WeightSensitivity { high, low } => [("high", *high), ("low", *low)]
                .into_iter()
                .map(|(label, weight)| {
                    ScenarioCase::new(
                        format!("{name}/{label}"),
                        Vec::new(),
                        vec![CaseEdge::new("0x1111", SENSITIVITY_TARGET, weight)],
                    )
                })
                .collect(),
            Scenario::Cycle { size, weight } => {
                let keys = numbered_keys(*size);
                let edges = (0..keys.len())
                    .map(|i| CaseEdge::new(&keys[i], &keys[(i + 1) % keys.len()], *weight))
                    .collect();
                vec![ScenarioCase::new(name, keys, edges)]
            }
            Scenario::SingleNode => {
                vec![ScenarioCase::new(name, vec!["0x1111".to_string()], Vec::new())]
            }
            Scenario::Dangling => vec![ScenarioCase::new(
                name,
                Vec::new(),
                vec![
                    CaseEdge::new("0x1111", "0x2222", 500_000),
                    CaseEdge::new("0x3333", "0x2222", 300_000),
                ],
            )],
            Scenario::Disconnected { size } => {
                vec![ScenarioCase::new(name, numbered_keys(*size), Vec::new())]
            }
            Scenario::Attestations { data, .. } => {
                let edges = data
                    .records()
                    .map(|(attester, borrower, weight)| CaseEdge::new(attester, borrower, weight))
                    .collect();
                vec![ScenarioCase::new(name, Vec::new(), edges)]
            }
            Scenario::Edges { nodes, edges, .. } => {
                vec![ScenarioCase::new(name, nodes.clone(), edges.clone())]
            }
        }
    }

    /// Check the scenario's own property on one producer's results.
    ///
    /// `results` is aligned with [`Scenario::cases`]. Returns a message per
    /// violated property.
    pub fn check(&self, results: &[QuantizedScores]) -> Vec<String> {
        let mut violations = Vec::new();
        match self {
            Scenario::WeightSensitivity { high, low } => {
                let [high_scores, low_scores] = results else {
                    return violations;
                };
                let (heavy, light) = if high >= low {
                    (high_scores, low_scores)
                } else {
                    (low_scores, high_scores)
                };
                let heavy_target = heavy.get(SENSITIVITY_TARGET).unwrap_or(0);
                let light_target = light.get(SENSITIVITY_TARGET).unwrap_or(0);
                if heavy_target < light_target {
                    violations.push(format!(
                        "{SENSITIVITY_TARGET} scored {heavy_target} with the heavier edge \
                         but {light_target} with the lighter one"
                    ));
                }
            }
            Scenario::Cycle { .. } | Scenario::Disconnected { .. } => {
                // Symmetric graphs: every node ranks the same, up to truncation
                for scores in results {
                    let min = scores.iter().map(|(_, s)| s).min().unwrap_or(0);
                    let max = scores.iter().map(|(_, s)| s).max().unwrap_or(0);
                    if max - min > 1 {
                        violations.push(format!(
                            "symmetric nodes ranked unevenly (min {min}, max {max})"
                        ));
                    }
                }
            }
            _ => {}
        }
        violations
    }
}

fn numbered_keys(size: usize) -> Vec<String> {
    (1..=size).map(|i| format!("0x{i:04x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suite_case_names_unique() {
        let names: Vec<String> = Scenario::default_suite()
            .iter()
            .flat_map(|s| s.cases())
            .map(|c| c.name)
            .collect();

        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
        assert!(names.contains(&"weight_sensitivity/high".to_string()));
    }

    #[test]
    fn test_basic_graph() {
        let case = &Scenario::Basic.cases()[0];
        let graph = case.build_graph(1_000_000).unwrap();

        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["0x1111", "0x2222", "0x3333"]);
        assert_eq!(graph.edge_weight("0x1111", "0x2222"), Some(0.8));
        assert_eq!(graph.edge_weight("0x1111", "0x3333"), Some(0.4));
    }

    #[test]
    fn test_cycle_wraps_around() {
        let case = &Scenario::Cycle { size: 3, weight: 1_000_000 }.cases()[0];
        let graph = case.build_graph(1_000_000).unwrap();

        assert_eq!(case.name, "cycle_3");
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_weight("0x0003", "0x0001"), Some(1.0));
    }

    #[test]
    fn test_isolated_nodes_kept() {
        let single = Scenario::SingleNode.cases()[0].build_graph(1_000_000).unwrap();
        assert_eq!(single.node_count(), 1);

        let disconnected = Scenario::Disconnected { size: 4 }.cases()[0]
            .build_graph(1_000_000)
            .unwrap();
        assert_eq!(disconnected.node_count(), 4);
        assert_eq!(disconnected.edge_count(), 0);
    }

    #[test]
    fn test_attestations_follow_records() {
        let data = AttestationData::from_json_str(
            r#"{"borrowers": ["0x2222"], "attesters": [["0x1111", "0x4444"]], "weights": [[100000, 200000]]}"#,
        )
        .unwrap();
        let cases = Scenario::Attestations {
            name: "sample".into(),
            data,
        }
        .cases();

        assert_eq!(cases[0].name, "sample");
        assert_eq!(
            cases[0].edges,
            vec![
                CaseEdge::new("0x1111", "0x2222", 100_000),
                CaseEdge::new("0x4444", "0x2222", 200_000),
            ]
        );
    }

    #[test]
    fn test_suite_from_json() {
        let suite = Scenario::suite_from_json_str(
            r#"[
                {"kind": "basic"},
                {"kind": "weight_sensitivity", "high": 800000, "low": 400000},
                {"kind": "edges", "name": "pair", "edges": [{"source": "a", "target": "b", "weight": 5}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(suite.len(), 3);
        assert_eq!(suite[0], Scenario::Basic);
        assert_eq!(suite[2].name(), "pair");
        assert!(Scenario::suite_from_json_str(r#"[{"kind": "unknown"}]"#).is_err());
    }

    #[test]
    fn test_weight_sensitivity_check() {
        let scenario = Scenario::WeightSensitivity {
            high: 800_000,
            low: 400_000,
        };
        let pair = |target: u64| QuantizedScores::from_iter([("0x1111", 0), ("0x2222", target)]);

        assert!(scenario.check(&[pair(649_122), pair(649_122)]).is_empty());
        assert!(scenario.check(&[pair(700_000), pair(600_000)]).is_empty());
        assert_eq!(scenario.check(&[pair(600_000), pair(700_000)]).len(), 1);

        // Reversed weights swap which case must score higher
        let reversed = Scenario::WeightSensitivity {
            high: 100_000,
            low: 900_000,
        };
        assert!(reversed.check(&[pair(600_000), pair(700_000)]).is_empty());
    }

    #[test]
    fn test_symmetry_check() {
        let scenario = Scenario::Cycle { size: 3, weight: 1 };
        let even = QuantizedScores::from_iter([("a", 333_333), ("b", 333_332), ("c", 333_333)]);
        let skewed = QuantizedScores::from_iter([("a", 300_000), ("b", 400_000), ("c", 300_000)]);

        assert!(scenario.check(&[even]).is_empty());
        assert_eq!(scenario.check(&[skewed]).len(), 1);
    }
}
