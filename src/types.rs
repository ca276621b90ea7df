//! Core types: ranking configuration and attestation input records.

use serde::{Deserialize, Serialize};

use crate::errors::{RankError, Result};

/// Default fixed-point scale shared with the on-chain implementation (1e6)
pub const DEFAULT_SCALE: u64 = 1_000_000;

/// Damping factor used by the oracle path
pub const ORACLE_DAMPING: f64 = 0.85;

/// Damping factor used by the calculator path
pub const CALCULATOR_DAMPING: f64 = 0.7;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default per-node convergence tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Where the rank held by dangling nodes goes on each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Spread uniformly over every node.
    #[default]
    Uniform,
    /// Spread according to the normalized personalization vector.
    Personalization,
}

/// Configuration for a ranking run
///
/// Every field has a default so partial JSON documents are accepted:
///
/// ```json
/// { "damping": 0.7, "max_iterations": 200 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Damping factor α, in (0, 1)
    pub damping: f64,
    /// Maximum number of power iterations
    pub max_iterations: usize,
    /// Convergence tolerance; iteration stops once the L1 delta drops
    /// below `tolerance * node_count`
    pub tolerance: f64,
    /// Fixed-point scale for weights and exported scores
    pub scale: u64,
    /// Dangling-node redistribution
    pub dangling: DanglingPolicy,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self::oracle()
    }
}

impl RankConfig {
    /// Oracle path: α = 0.85
    pub fn oracle() -> Self {
        Self {
            damping: ORACLE_DAMPING,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            scale: DEFAULT_SCALE,
            dangling: DanglingPolicy::Uniform,
        }
    }

    /// Calculator path: α = 0.7
    pub fn calculator() -> Self {
        Self {
            damping: CALCULATOR_DAMPING,
            ..Self::oracle()
        }
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

    /// Set the fixed-point scale
    pub fn with_scale(mut self, scale: u64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the dangling-node policy
    pub fn with_dangling(mut self, dangling: DanglingPolicy) -> Self {
        self.dangling = dangling;
        self
    }

    /// Parse a configuration from JSON, then validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter; the first violation is returned.
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(RankError::InvalidScale(self.scale));
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(RankError::InvalidDamping(self.damping));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(RankError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Attestation data as exported by the contract: three aligned sequences.
///
/// `attesters[i]` and `weights[i]` belong to `borrowers[i]`, and
/// `weights[i][j]` is the weight `attesters[i][j]` gave on the configured
/// scale. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
    #[serde(default)]
    pub borrowers: Vec<String>,
    #[serde(default)]
    pub attesters: Vec<Vec<String>>,
    #[serde(default)]
    pub weights: Vec<Vec<u64>>,
}

impl AttestationData {
    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Iterate over the aligned `(attester, borrower, weight)` triples.
    ///
    /// Entries present in one sequence but not its partner are skipped.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, u64)> + '_ {
        self.borrowers
            .iter()
            .zip(self.attesters.iter().zip(self.weights.iter()))
            .flat_map(|(borrower, (attesters, weights))| {
                attesters
                    .iter()
                    .zip(weights.iter())
                    .map(move |(attester, &weight)| {
                        (attester.as_str(), borrower.as_str(), weight)
                    })
            })
    }
}

/// A single flat attestation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub attester: String,
    pub borrower: String,
    pub weight: u64,
}

impl Attestation {
    pub fn new(attester: impl Into<String>, borrower: impl Into<String>, weight: u64) -> Self {
        Self {
            attester: attester.into(),
            borrower: borrower.into(),
            weight,
        }
    }
}
