//! Color limits used to normalize data values for color mapping.

use serde::{Deserialize, Serialize};

/// A (min, max) pair used for color mapping normalization.
///
/// `min > max` is allowed and means the color scale is reversed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorLimits {
    pub min: f64,
    pub max: f64,
}

impl ColorLimits {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The same limits with min and max swapped.
    pub fn flipped(&self) -> Self {
        Self {
            min: self.max,
            max: self.min,
        }
    }

    /// True when the color scale runs from high to low.
    pub fn is_reversed(&self) -> bool {
        self.max - self.min < 0.0
    }

    /// Limits in ascending order.
    pub fn ordered(&self) -> (f64, f64) {
        if self.is_reversed() {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        }
    }

    /// Map limits through a value conversion, keeping orientation.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            min: f(self.min),
            max: f(self.max),
        }
    }

    /// Fraction of the ascending range covered by `value`, clamped to 0..=1.
    ///
    /// Returns `None` for NaN input or a zero-width range.
    pub fn bar_width(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let (lo, hi) = self.ordered();
        if hi == lo {
            return None;
        }
        Some((value.clamp(lo, hi) - lo) / (hi - lo))
    }

    /// Scale `value` onto 0..=255 honoring reversed limits.
    ///
    /// Equal limits map everything to 0.
    pub fn to_byte(&self, value: f64) -> u8 {
        if self.min == self.max {
            return 0;
        }
        let clamped = if self.is_reversed() {
            value.clamp(self.max, self.min)
        } else {
            value.clamp(self.min, self.max)
        };
        let scaled = (clamped - self.min).abs() / (self.max - self.min).abs() * 255.0;
        scaled.round() as u8
    }
}

impl From<(f64, f64)> for ColorLimits {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl std::fmt::Display for ColorLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
