//! Comparison harness
//!
//! Checks a ranking implementation against a reference one:
//! - [`compare`]: per-node differences between two integer score maps
//! - [`Scenario`]: named graph families, describable as JSON
//! - [`ComparisonHarness`]: runs a suite through two [`ScoreProducer`]s and
//!   collects a [`HarnessReport`]

pub mod compare;
pub mod runner;
pub mod scenario;

pub use compare::{compare, compare_default, ComparisonResult, NodeDiff, DEFAULT_MATCH_TOLERANCE};
pub use runner::{
    BaselineProducer, CaseOutcome, ComparisonHarness, EngineProducer, HarnessReport,
    ScenarioOutcome, ScoreProducer,
};
pub use scenario::{CaseEdge, Scenario, ScenarioCase};
