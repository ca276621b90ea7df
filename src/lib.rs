//! attest-rank: PageRank reputation scores for attestation graphs
//!
//! Attesters vouch for borrowers with integer weights on a fixed scale. The
//! crate builds the weighted attestation graph, ranks it with PageRank and
//! exports integer scores on the same scale:
//!
//! ```rust,ignore
//! use attest_rank::{AttestationData, Oracle};
//!
//! let data = AttestationData::from_json_str(json)?;
//! let scores = Oracle::new().compute_from_attestations(&data)?;
//! for (address, score) in scores.iter() {
//!     println!("{address}: {score}");
//! }
//! ```
//!
//! [`harness`] compares two score producers across a suite of scenarios.

pub mod engine;
pub mod errors;
pub mod graph;
pub mod harness;
pub mod oracle;
pub mod pagerank;
pub mod quantize;
pub mod scores;
pub mod types;

pub use engine::RankEngine;
pub use errors::{RankError, Result};
pub use graph::builder::{GraphInfo, WeightedGraph};
pub use graph::csr::CsrGraph;
pub use harness::{compare, ComparisonHarness, ComparisonResult, HarnessReport, Scenario, ScoreProducer};
pub use oracle::{compute_scores, Oracle};
pub use pagerank::personalized::PersonalizedPageRank;
pub use pagerank::PageRankResult;
pub use quantize::Quantizer;
pub use scores::{QuantizedScores, RankedScores, ScoreUpdateBatch};
pub use types::{
    Attestation, AttestationData, DanglingPolicy, RankConfig, CALCULATOR_DAMPING, DEFAULT_SCALE,
    ORACLE_DAMPING,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
