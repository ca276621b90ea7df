//! Score maps
//!
//! [`RankedScores`] holds the raw unit-interval scores of one ranking run
//! together with its convergence diagnostics. [`QuantizedScores`] is the
//! integer export on the fixed scale and the shape both producers hand to the
//! comparison harness. Both keep node insertion order.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::Result;
use crate::quantize::Quantizer;

// ============================================================================
// RankedScores: raw scores plus diagnostics
// ============================================================================

/// Raw scores in [0, 1] for every node of a ranking run
#[derive(Debug, Clone, PartialEq)]
pub struct RankedScores {
    entries: Vec<(String, f64)>,
    /// Power iterations performed
    pub iterations: usize,
    /// L1 delta of the final iteration
    pub delta: f64,
    /// Whether the run stopped on the tolerance rather than the iteration cap
    pub converged: bool,
}

impl RankedScores {
    pub(crate) fn new(
        entries: Vec<(String, f64)>,
        iterations: usize,
        delta: f64,
        converged: bool,
    ) -> Self {
        Self {
            entries,
            iterations,
            delta,
            converged,
        }
    }

    /// An empty result (the ranking of an empty graph)
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0.0, true)
    }

    /// Score of `key` (linear scan)
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|&(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, score)` in node insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }

    /// Sum of all scores
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, s)| s).sum()
    }

    /// Top `n` nodes by descending score; ties keep insertion order
    pub fn top_n(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Truncate every score onto the quantizer's scale
    pub fn quantize(&self, quantizer: &Quantizer) -> QuantizedScores {
        self.entries
            .iter()
            .map(|(k, s)| (k.clone(), quantizer.to_scaled(*s)))
            .collect()
    }
}

// ============================================================================
// QuantizedScores: ordered key -> integer map
// ============================================================================

/// Integer scores on a fixed scale, in insertion order
///
/// Serializes as a flat JSON object (`{"0x1111": 259740, ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizedScores {
    entries: Vec<(String, u64)>,
    index: FxHashMap<String, usize>,
}

/// Parallel address / score vectors for a batched score update call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreUpdateBatch {
    pub addresses: Vec<String>,
    pub scores: Vec<u64>,
}

impl QuantizedScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat `{key: int}` JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Insert or overwrite a score; an overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, score: u64) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = score,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, score));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&pos| self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, score)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Whether both maps hold exactly the same key set (order ignored)
    pub fn same_keys(&self, other: &QuantizedScores) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.contains_key(k))
    }

    /// Sum of all scores; may fall short of the scale by truncation
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|&(_, s)| s).sum()
    }

    /// Whether every score lies in `0..=scale`
    pub fn all_within(&self, scale: u64) -> bool {
        self.entries.iter().all(|&(_, s)| s <= scale)
    }

    /// Split into the parallel vectors a batched update call takes
    pub fn to_update_batch(&self) -> ScoreUpdateBatch {
        let (addresses, scores) = self.entries.iter().cloned().unzip();
        ScoreUpdateBatch { addresses, scores }
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for QuantizedScores {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut scores = Self::new();
        for (key, score) in iter {
            scores.insert(key, score);
        }
        scores
    }
}

impl Serialize for QuantizedScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, score) in &self.entries {
            map.serialize_entry(key, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QuantizedScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = QuantizedScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of node keys to non-negative integer scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut scores = QuantizedScores::new();
                while let Some((key, score)) = access.next_entry::<String, u64>()? {
                    scores.insert(key, score);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}
