//! Fixed-point quantization
//!
//! Converts between unit-interval reals and integers on a fixed scale.
//! Scaling up truncates toward zero, matching fixed-point integer division
//! on chain. It never rounds.

use crate::errors::{RankError, Result};

/// Convert an integer on `scale` to a real: `value / scale`.
pub fn to_unit(value: u64, scale: u64) -> Result<f64> {
    Ok(Quantizer::new(scale)?.to_unit(value))
}

/// Convert a real to an integer on `scale`, truncating toward zero.
pub fn to_scaled(value: f64, scale: u64) -> Result<u64> {
    Ok(Quantizer::new(scale)?.to_scaled(value))
}

/// A quantizer bound to a validated, non-zero scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    scale: u64,
}

impl Quantizer {
    /// Create a quantizer; a zero scale is rejected.
    pub fn new(scale: u64) -> Result<Self> {
        if scale == 0 {
            return Err(RankError::InvalidScale(scale));
        }
        Ok(Self { scale })
    }

    /// The scale this quantizer maps onto
    pub fn scale(&self) -> u64 {
        self.scale
    }

    /// `value / scale`
    #[inline]
    pub fn to_unit(&self, value: u64) -> f64 {
        value as f64 / self.scale as f64
    }

    /// `trunc(value * scale)`
    ///
    /// Negative and NaN inputs saturate to 0, values past `u64::MAX` to
    /// `u64::MAX` (float-to-int `as` casts saturate).
    #[inline]
    pub fn to_scaled(&self, value: f64) -> u64 {
        (value * self.scale as f64) as u64
    }
}
