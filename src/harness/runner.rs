//! Harness runner.
//!
//! [`ComparisonHarness`] feeds every case of a scenario suite to two
//! [`ScoreProducer`]s, compares their score maps and checks each scenario's
//! own property on both sides. Every case is evaluated; a producer failure is
//! recorded on its case and never aborts the run, so the report shows all
//! problems at once.

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::compare::{compare, ComparisonResult, DEFAULT_MATCH_TOLERANCE};
use super::scenario::{Scenario, ScenarioCase};
use crate::engine::RankEngine;
use crate::errors::{RankError, Result};
use crate::scores::QuantizedScores;
use crate::types::RankConfig;

// ─── Producers ──────────────────────────────────────────────────────────────

/// Something that turns a case into integer scores.
pub trait ScoreProducer {
    /// Short, stable label used in reports (e.g. `"engine"`).
    fn name(&self) -> &str;

    fn produce(&self, case: &ScenarioCase) -> Result<QuantizedScores>;
}

/// Produces scores with [`RankEngine`].
#[derive(Debug, Clone)]
pub struct EngineProducer {
    name: String,
    config: RankConfig,
}

impl EngineProducer {
    pub fn new(name: impl Into<String>, config: RankConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

impl ScoreProducer for EngineProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self, case: &ScenarioCase) -> Result<QuantizedScores> {
        let graph = case.build_graph(self.config.scale)?;
        RankEngine::new(self.config.clone()).rank_quantized(graph)
    }
}

/// Replays previously recorded scores, keyed by case name.
///
/// The recording is a JSON object of case name to score map, e.g.
/// `{"basic": {"0x1111": 259740, "0x2222": 406926, "0x3333": 333333}}`.
#[derive(Debug, Clone, Default)]
pub struct BaselineProducer {
    name: String,
    baselines: FxHashMap<String, QuantizedScores>,
}

impl BaselineProducer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            baselines: FxHashMap::default(),
        }
    }

    /// Load a recording
    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            baselines: serde_json::from_str(json)?,
        })
    }

    /// Record scores for one case
    pub fn with_case(mut self, case: impl Into<String>, scores: QuantizedScores) -> Self {
        self.baselines.insert(case.into(), scores);
        self
    }
}

impl ScoreProducer for BaselineProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self, case: &ScenarioCase) -> Result<QuantizedScores> {
        self.baselines
            .get(&case.name)
            .cloned()
            .ok_or_else(|| RankError::Producer {
                producer: self.name.clone(),
                message: format!("no recorded scores for case '{}'", case.name),
            })
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Result of one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub case: String,
    /// Absent when either producer failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.comparison.as_ref().is_some_and(|c| c.matches)
    }
}

/// Result of one scenario: its cases plus property violations
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub cases: Vec<CaseOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.cases.iter().all(CaseOutcome::passed)
    }
}

/// Collected outcomes of a suite run
#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub reference: String,
    pub candidate: String,
    pub tolerance: u64,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl HarnessReport {
    /// Returns `true` if every scenario passed
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioOutcome::passed)
    }

    /// Iterate over failed scenarios
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.scenarios.iter().filter(|s| !s.passed())
    }

    /// Total number of cases run
    pub fn case_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.cases.len()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ─── Harness ────────────────────────────────────────────────────────────────

/// Compares a candidate producer against a reference producer
#[derive(Debug, Clone)]
pub struct ComparisonHarness<R, C> {
    reference: R,
    candidate: C,
    tolerance: u64,
}

impl<R: ScoreProducer, C: ScoreProducer> ComparisonHarness<R, C> {
    pub fn new(reference: R, candidate: C) -> Self {
        Self {
            reference,
            candidate,
            tolerance: DEFAULT_MATCH_TOLERANCE,
        }
    }

    /// Set the absolute tolerance on the average per-node difference
    pub fn with_tolerance(mut self, tolerance: u64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Run every scenario of a suite
    pub fn run(&self, suite: &[Scenario]) -> HarnessReport {
        let scenarios = suite.iter().map(|s| self.run_scenario(s)).collect();
        let report = HarnessReport {
            reference: self.reference.name().to_string(),
            candidate: self.candidate.name().to_string(),
            tolerance: self.tolerance,
            scenarios,
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            reference = %report.reference,
            candidate = %report.candidate,
            scenarios = report.scenarios.len(),
            cases = report.case_count(),
            failed = report.failures().count(),
            "comparison suite finished"
        );

        report
    }

    /// Run a single scenario
    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioOutcome {
        let name = scenario.name();
        let mut cases = Vec::new();
        let mut reference_results = Vec::new();
        let mut candidate_results = Vec::new();

        for case in scenario.cases() {
            let reference = self.reference.produce(&case);
            let candidate = self.candidate.produce(&case);

            let outcome = match (&reference, &candidate) {
                (Ok(r), Ok(c)) => CaseOutcome {
                    case: case.name.clone(),
                    comparison: Some(compare(r, c, self.tolerance)),
                    errors: Vec::new(),
                },
                _ => CaseOutcome {
                    case: case.name.clone(),
                    comparison: None,
                    errors: [reference.as_ref().err(), candidate.as_ref().err()]
                        .into_iter()
                        .flatten()
                        .map(ToString::to_string)
                        .collect(),
                },
            };

            #[cfg(feature = "tracing")]
            if outcome.passed() {
                tracing::debug!(scenario = %name, case = %outcome.case, "case matched");
            } else {
                tracing::warn!(
                    scenario = %name,
                    case = %outcome.case,
                    avg_diff = ?outcome.comparison.as_ref().map(|c| c.avg_diff),
                    errors = outcome.errors.len(),
                    "case failed"
                );
            }

            cases.push(outcome);
            reference_results.push(reference.ok());
            candidate_results.push(candidate.ok());
        }

        let mut violations = Vec::new();
        for (producer, results) in [
            (self.reference.name(), reference_results),
            (self.candidate.name(), candidate_results),
        ] {
            // Properties need every case; a failed case is already reported
            let Some(results) = results.into_iter().collect::<Option<Vec<_>>>() else {
                continue;
            };
            violations.extend(
                scenario
                    .check(&results)
                    .into_iter()
                    .map(|v| format!("{producer}: {v}")),
            );
        }

        ScenarioOutcome {
            scenario: name,
            cases,
            violations,
        }
    }
}
