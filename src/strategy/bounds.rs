//! Inclusive numeric bounds.
//!
//! Every `min_*`/`max_*` pair on a strategy goes through [`Bound`], so the
//! "unset bound never filters, missing value fails a set bound" rule lives in
//! exactly one place.

/// An inclusive `[min, max]` range where either side may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bound {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bound {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Lower limit, if it is a usable number.
    pub fn min(&self) -> Option<f64> {
        self.min.filter(|v| v.is_finite())
    }

    /// Upper limit, if it is a usable number.
    pub fn max(&self) -> Option<f64> {
        self.max.filter(|v| v.is_finite())
    }

    /// Whether either side is active. Non-finite limits count as unset.
    pub fn is_set(&self) -> bool {
        self.min().is_some() || self.max().is_some()
    }

    /// Check a value against the bound.
    ///
    /// An unset bound admits everything, including a missing value. A set
    /// bound rejects a missing or non-finite value.
    pub fn admits(&self, value: Option<f64>) -> bool {
        if !self.is_set() {
            return true;
        }
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return false;
        };
        if let Some(min) = self.min() {
            if v < min {
                return false;
            }
        }
        if let Some(max) = self.max() {
            if v > max {
                return false;
            }
        }
        true
    }
}
