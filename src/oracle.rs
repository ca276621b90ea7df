//! Attestation oracle
//!
//! Turns contract attestation exports into integer credit scores:
//! attestations → [`WeightedGraph`] → [`RankEngine`] → [`QuantizedScores`].
//!
//! The oracle holds configuration only. Each call builds its graph from
//! scratch and hands it to the engine by value, so successive calls (and
//! separate oracle instances) never share graph state.

use crate::engine::RankEngine;
use crate::errors::Result;
use crate::graph::builder::WeightedGraph;
use crate::quantize::Quantizer;
use crate::scores::{QuantizedScores, RankedScores};
use crate::types::{Attestation, AttestationData, RankConfig};

/// Enter a tracing span for an oracle stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("oracle_stage", stage = $name).entered();
    };
}

const STAGE_INGEST: &str = "ingest";
const STAGE_RANK: &str = "rank";
const STAGE_EXPORT: &str = "export";

/// Computes quantized scores from attestation data
#[derive(Debug, Clone, Default)]
pub struct Oracle {
    config: RankConfig,
    /// Teleport bias on the configured scale
    personalization: Option<Vec<(String, u64)>>,
}

impl Oracle {
    /// Create an oracle with the oracle-path preset (α = 0.85)
    pub fn new() -> Self {
        Self::with_config(RankConfig::oracle())
    }

    /// Create with custom config
    pub fn with_config(config: RankConfig) -> Self {
        Self {
            config,
            personalization: None,
        }
    }

    /// Bias teleportation with integer weights on the configured scale.
    pub fn with_personalization<K, I>(mut self, personalization: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, u64)>,
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

    /// Build the attestation graph: one edge `attester -> borrower` per
    /// aligned `(attester, weight)` pair.
    ///
    /// Sequences of unequal length are truncated to the shorter one, and a
    /// repeated `(attester, borrower)` pair keeps the last weight.
    pub fn build_graph(&self, data: &AttestationData) -> Result<WeightedGraph> {
        trace_stage!(STAGE_INGEST);
        let mut graph = WeightedGraph::with_capacity(data.borrowers.len() * 2);
        for (attester, borrower, weight) in data.records() {
            graph.add_edge(attester, borrower, weight, self.config.scale)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            borrowers = data.borrowers.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "attestation graph built"
        );

        Ok(graph)
    }

    /// Build the attestation graph from flat records, in record order.
    pub fn build_graph_from_records(&self, records: &[Attestation]) -> Result<WeightedGraph> {
        trace_stage!(STAGE_INGEST);
        let mut graph = WeightedGraph::with_capacity(records.len());
        for record in records {
            graph.add_edge(&record.attester, &record.borrower, record.weight, self.config.scale)?;
        }
        Ok(graph)
    }

    /// Rank the attestation graph and return raw scores with diagnostics.
    pub fn compute_raw_from_attestations(&self, data: &AttestationData) -> Result<RankedScores> {
        let graph = self.build_graph(data)?;
        self.rank(graph)
    }

    /// Rank the attestation graph and export integer scores on the
    /// configured scale.
    pub fn compute_from_attestations(&self, data: &AttestationData) -> Result<QuantizedScores> {
        let raw = self.compute_raw_from_attestations(data)?;
        self.export(&raw)
    }

    /// Same as [`Oracle::compute_from_attestations`] for flat records.
    pub fn compute_from_records(&self, records: &[Attestation]) -> Result<QuantizedScores> {
        let graph = self.build_graph_from_records(records)?;
        let raw = self.rank(graph)?;
        self.export(&raw)
    }

    fn rank(&self, graph: WeightedGraph) -> Result<RankedScores> {
        trace_stage!(STAGE_RANK);
        let mut engine = RankEngine::new(self.config.clone());

        if let Some(personalization) = &self.personalization {
            let quantizer = Quantizer::new(self.config.scale)?;
            engine = engine.with_personalization(
                personalization
                    .iter()
                    .map(|(k, w)| (k.as_str(), quantizer.to_unit(*w))),
            );
        }

        engine.rank(graph)
    }

    fn export(&self, raw: &RankedScores) -> Result<QuantizedScores> {
        trace_stage!(STAGE_EXPORT);
        let quantizer = Quantizer::new(self.config.scale)?;
        let scores = raw.quantize(&quantizer);

        #[cfg(feature = "tracing")]
        tracing::info!(
            addresses = scores.len(),
            iterations = raw.iterations,
            converged = raw.converged,
            "scores exported"
        );

        Ok(scores)
    }
}

/// Convenience function: oracle-path scores for an attestation export
pub fn compute_scores(data: &AttestationData, config: &RankConfig) -> Result<QuantizedScores> {
    Oracle::with_config(config.clone()).compute_from_attestations(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RankError;

    fn sample_data() -> AttestationData {
        AttestationData::from_json_str(
            r#"{
                "borrowers": ["0x2222", "0x3333"],
                "attesters": [["0x1111", "0x4444"], ["0x1111"]],
                "weights": [[100000, 200000], [300000]]
            }"#,
        )
        .unwrap()
    }

    fn network_data() -> AttestationData {
        AttestationData {
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
        }
    }

    #[test]
    fn test_build_graph_directs_attester_to_borrower() {
        let graph = Oracle::new().build_graph(&sample_data()).unwrap();

        assert_eq!(
            graph.nodes().collect::<Vec<_>>(),
            vec!["0x1111", "0x2222", "0x4444", "0x3333"]
        );
        assert_eq!(graph.edge_weight("0x1111", "0x2222"), Some(0.1));
        assert_eq!(graph.edge_weight("0x4444", "0x2222"), Some(0.2));
        assert_eq!(graph.edge_weight("0x1111", "0x3333"), Some(0.3));
        assert_eq!(graph.edge_weight("0x2222", "0x1111"), None);
    }

    #[test]
    fn test_sample_scores_both_presets() {
        let oracle = Oracle::new().compute_from_attestations(&sample_data()).unwrap();
        assert_eq!(
            oracle.iter().collect::<Vec<_>>(),
            vec![("0x1111", 175_438), ("0x2222", 361_842), ("0x4444", 175_438), ("0x3333", 287_280)]
        );

        let calculator = Oracle::with_config(RankConfig::calculator())
            .compute_from_attestations(&sample_data())
            .unwrap();
        assert_eq!(
            calculator.iter().collect::<Vec<_>>(),
            vec![("0x1111", 185_185), ("0x2222", 347_221), ("0x4444", 185_185), ("0x3333", 282_407)]
        );
    }

    #[test]
    fn test_network_scores_in_range() {
        let oracle = Oracle::with_config(RankConfig::calculator());
        let raw = oracle.compute_raw_from_attestations(&network_data()).unwrap();
        let scores = oracle.compute_from_attestations(&network_data()).unwrap();

        assert!(raw.converged);
        assert!((raw.total() - 1.0).abs() < 1e-9);
        assert_eq!(scores.len(), 7);
        assert!(scores.all_within(1_000_000));
        // Truncation can only lose mass
        assert!(scores.total() <= 1_000_000);
        assert_eq!(scores.get("0x4444"), Some(284_242));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let oracle = Oracle::new();

        let first = oracle.compute_from_attestations(&network_data()).unwrap();
        let other = oracle.compute_from_attestations(&sample_data()).unwrap();
        let second = oracle.compute_from_attestations(&network_data()).unwrap();

        assert_eq!(first, second);
        // Nothing from the first graph leaks into another call
        assert!(!other.contains_key("0x7777"));
        assert_eq!(other.len(), 4);
    }

    #[test]
    fn test_mismatched_lengths_are_skipped() {
        let data = AttestationData {
            borrowers: vec!["0x2222".into(), "0x3333".into()],
            attesters: vec![vec!["0x1111".into(), "0x4444".into()]],
            weights: vec![vec![100_000], vec![300_000]],
        };

        let scores = Oracle::new().compute_from_attestations(&data).unwrap();
        assert_eq!(scores.keys().collect::<Vec<_>>(), vec!["0x1111", "0x2222"]);
    }

    #[test]
    fn test_empty_data() {
        let scores = Oracle::new()
            .compute_from_attestations(&AttestationData::default())
            .unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_compute_from_records_last_weight_wins() {
        let records = vec![
            Attestation::new("0x1111", "0x2222", 100_000),
            Attestation::new("0x1111", "0x2222", 900_000),
        ];
        let scores = Oracle::with_config(RankConfig::calculator())
            .compute_from_records(&records)
            .unwrap();

        assert_eq!(scores.get("0x1111"), Some(370_370));
        assert_eq!(scores.get("0x2222"), Some(629_629));
    }

    #[test]
    fn test_records_and_aligned_data_agree() {
        let data = network_data();
        let records: Vec<_> = data
            .records()
            .map(|(a, b, w)| Attestation::new(a, b, w))
            .collect();

        let oracle = Oracle::new();
        assert_eq!(
            oracle.compute_from_records(&records).unwrap(),
            oracle.compute_from_attestations(&data).unwrap()
        );
    }

    #[test]
    fn test_personalization_on_scale() {
        let data = sample_data();
        let biased = Oracle::new()
            .with_personalization([("0x4444", 1_000_000)])
            .compute_from_attestations(&data)
            .unwrap();
        let plain = Oracle::new().compute_from_attestations(&data).unwrap();

        assert!(biased.get("0x4444").unwrap() > plain.get("0x4444").unwrap());
        assert!(biased.get("0x1111").unwrap() < plain.get("0x1111").unwrap());
    }

    #[test]
    fn test_zero_scale_is_domain_error() {
        let err = Oracle::with_config(RankConfig::oracle().with_scale(0))
            .compute_from_attestations(&sample_data())
            .unwrap_err();
        assert!(matches!(err, RankError::InvalidScale(0)));
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_stage_spans_are_siblings() {
        use std::sync::{Arc, Mutex};

        use tracing::field::{Field, Visit};
        use tracing::span::{Attributes, Id};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::registry::LookupSpan;
        use tracing_subscriber::Layer;

        struct Stage(String);

        #[derive(Default)]
        struct StageVisitor(Option<String>);

        impl Visit for StageVisitor {
            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "stage" {
                    self.0 = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "stage" {
                    self.0 = Some(format!("{value:?}"));
                }
            }
        }

        /// Records `(stage, parent stage)` for every stage span opened
        #[derive(Clone, Default)]
        struct StageRecorder(Arc<Mutex<Vec<(String, Option<String>)>>>);

        impl<S> Layer<S> for StageRecorder
        where
            S: tracing::Subscriber + for<'a> LookupSpan<'a>,
        {
            fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
                let mut visitor = StageVisitor::default();
                attrs.record(&mut visitor);
                let (Some(stage), Some(span)) = (visitor.0, ctx.span(id)) else {
                    return;
                };
                let parent = span
                    .parent()
                    .and_then(|p| p.extensions().get::<Stage>().map(|s| s.0.clone()));
                span.extensions_mut().insert(Stage(stage.clone()));
                self.0.lock().unwrap().push((stage, parent));
            }
        }

        let recorder = StageRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            Oracle::new().compute_from_attestations(&sample_data()).unwrap();
            Oracle::new()
                .compute_from_records(&[Attestation::new("0x1111", "0x2222", 500_000)])
                .unwrap();
        });

        let stages = recorder.0.lock().unwrap().clone();
        let expected: Vec<(String, Option<String>)> = [STAGE_INGEST, STAGE_RANK, STAGE_EXPORT]
            .repeat(2)
            .into_iter()
            .map(|s| (s.to_string(), None))
            .collect();
        assert_eq!(stages, expected);
    }

    #[test]
    fn test_compute_scores_helper() {
        let scores = compute_scores(&sample_data(), &RankConfig::oracle()).unwrap();
        assert_eq!(scores, Oracle::new().compute_from_attestations(&sample_data()).unwrap());
    }
}
