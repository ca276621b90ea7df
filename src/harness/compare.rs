//! Score-map comparison.
//!
//! [`compare`] is a pure function over two integer score maps. A key-set
//! mismatch is a failed result rather than an error: comparing rankings of
//! different graphs is meaningless, so no per-node diffs are produced.

use serde::Serialize;

use crate::scores::QuantizedScores;

/// Default match tolerance: 1000 on a 1,000,000 scale (0.1%)
pub const DEFAULT_MATCH_TOLERANCE: u64 = 1_000;

// ─── Per-node difference ────────────────────────────────────────────────────

/// Scores of one node under both producers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDiff {
    pub node: String,
    pub reference: u64,
    pub candidate: u64,
    pub difference: u64,
}

// ─── Result ─────────────────────────────────────────────────────────────────

/// Outcome of comparing two score maps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Whether both maps cover exactly the same nodes
    pub keys_match: bool,
    /// Per-node differences, in the reference map's order
    pub diffs: Vec<NodeDiff>,
    pub max_diff: u64,
    pub avg_diff: f64,
    /// Tolerance the average difference was checked against
    pub tolerance: u64,
    /// `keys_match && (both empty || avg_diff < tolerance)`
    pub matches: bool,
}

impl ComparisonResult {
    fn key_mismatch(tolerance: u64) -> Self {
        Self {
            keys_match: false,
            diffs: Vec::new(),
            max_diff: 0,
            avg_diff: 0.0,
            tolerance,
            matches: false,
        }
    }

    /// Nodes whose scores differ at all
    pub fn mismatched_nodes(&self) -> impl Iterator<Item = &NodeDiff> {
        self.diffs.iter().filter(|d| d.difference > 0)
    }

    /// Whether both maps are identical
    pub fn is_exact(&self) -> bool {
        self.keys_match && self.max_diff == 0
    }
}

// ─── compare ────────────────────────────────────────────────────────────────

/// Compare two score maps against an absolute tolerance on the average
/// per-node difference.
///
/// Two empty maps match at any tolerance.
pub fn compare(
    reference: &QuantizedScores,
    candidate: &QuantizedScores,
    tolerance: u64,
) -> ComparisonResult {
    if !reference.same_keys(candidate) {
        return ComparisonResult::key_mismatch(tolerance);
    }

    let diffs: Vec<NodeDiff> = reference
        .iter()
        .filter_map(|(node, r)| {
            candidate.get(node).map(|c| NodeDiff {
                node: node.to_string(),
                reference: r,
                candidate: c,
                difference: r.abs_diff(c),
            })
        })
        .collect();

    let max_diff = diffs.iter().map(|d| d.difference).max().unwrap_or(0);
    let avg_diff = if diffs.is_empty() {
        0.0
    } else {
        diffs.iter().map(|d| d.difference as f64).sum::<f64>() / diffs.len() as f64
    };

    ComparisonResult {
        keys_match: true,
        matches: diffs.is_empty() || avg_diff < tolerance as f64,
        diffs,
        max_diff,
        avg_diff,
        tolerance,
    }
}

/// [`compare`] with [`DEFAULT_MATCH_TOLERANCE`]
pub fn compare_default(reference: &QuantizedScores, candidate: &QuantizedScores) -> ComparisonResult {
    compare(reference, candidate, DEFAULT_MATCH_TOLERANCE)
}
