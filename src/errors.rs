//! Error types
//!
//! Configuration misuse (scale, damping, tolerance, personalization) is
//! reported immediately. Non-convergence and key-set mismatches are not
//! errors; see [`crate::PageRankResult::converged`] and
//! [`crate::harness::ComparisonResult::keys_match`].

use thiserror::Error;

/// Errors produced by the ranking oracle
#[derive(Debug, Error)]
pub enum RankError {
    /// Quantization scale of zero
    #[error("invalid scale: {0} (must be greater than zero)")]
    InvalidScale(u64),

    /// Damping factor outside the open interval (0, 1)
    #[error("invalid damping factor: {0} (must be in the open interval (0, 1))")]
    InvalidDamping(f64),

    /// Negative or non-finite convergence tolerance
    #[error("invalid tolerance: {0} (must be finite and non-negative)")]
    InvalidTolerance(f64),

    /// Personalization weight that is negative or non-finite
    #[error("invalid personalization weight for node '{node}': {weight}")]
    InvalidPersonalization { node: String, weight: f64 },

    /// A score producer failed to produce scores for a case
    #[error("producer '{producer}' failed: {message}")]
    Producer { producer: String, message: String },

    /// Malformed JSON document
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ranking operations
pub type Result<T> = std::result::Result<T, RankError>;
