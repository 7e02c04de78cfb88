//! Log-scale histogram over non-negative integers.
//!
//! Bin `0` starts at zero, bin `1` at `first_bin`, and every later bin
//! starts at `ceil(previous_start * growth_factor)`. Values at or above the
//! last start land in the last bin. Two histograms can only be merged when
//! they were built from the same [`HistogramShape`].

use serde::{Deserialize, Serialize};

/// Bucketing parameters. One shape is used for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramShape {
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_first_bin")]
    pub first_bin: u64,
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
}

fn default_bins() -> usize { 20 }
fn default_first_bin() -> u64 { 10 }
fn default_growth_factor() -> f64 { 3.0 }

impl Default for HistogramShape {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            first_bin: default_first_bin(),
            growth_factor: default_growth_factor(),
        }
    }
}

impl HistogramShape {
    pub fn validate(&self) -> Result<(), HistogramError> {
        if self.bins < 2 {
            return Err(HistogramError::InvalidShape(format!(
                "bins must be at least 2, got {}",
                self.bins
            )));
        }
        if self.first_bin == 0 {
            return Err(HistogramError::InvalidShape("first_bin must be positive".into()));
        }
        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(HistogramError::InvalidShape(format!(
                "growth_factor must be a finite number above 1.0, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Lower bound of every bin.
    pub fn ranges(&self) -> Vec<u64> {
        let mut ranges = Vec::with_capacity(self.bins);
        ranges.push(0);
        if self.bins > 1 {
            ranges.push(self.first_bin);
        }
        while ranges.len() < self.bins {
            let prev = ranges[ranges.len() - 1] as f64;
            // `as` saturates at u64::MAX.
            ranges.push((prev * self.growth_factor).ceil() as u64);
        }
        ranges
    }

    pub(crate) fn same_as(&self, other: &HistogramShape) -> bool {
        self.bins == other.bins
            && self.first_bin == other.first_bin
            && self.growth_factor.to_bits() == other.growth_factor.to_bits()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistogramError {
    #[error("histogram shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: HistogramShape,
        right: HistogramShape,
    },

    #[error("invalid histogram shape: {0}")]
    InvalidShape(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    #[serde(skip)]
    shape: HistogramShape,
    ranges: Vec<u64>,
    counts: Vec<u64>,
    total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<u64>,
}

impl Histogram {
    pub fn new(shape: HistogramShape) -> Self {
        let ranges = shape.ranges();
        Self {
            shape,
            counts: vec![0; ranges.len()],
            ranges,
            total_count: 0,
            min: None,
            max: None,
        }
    }

    pub fn shape(&self) -> HistogramShape {
        self.shape
    }

    pub fn add(&mut self, value: u64) {
        let idx = self
            .ranges
            .partition_point(|&lo| lo <= value)
            .saturating_sub(1);
        self.counts[idx] += 1;
        self.total_count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Bucket-wise addition of `other` into `self`.
    pub fn merge(&mut self, other: &Histogram) -> Result<(), HistogramError> {
        if !self.shape.same_as(&other.shape) {
            return Err(HistogramError::ShapeMismatch {
                left: self.shape,
                right: other.shape,
            });
        }
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst += src;
        }
        self.total_count += other.total_count;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        Ok(())
    }

    pub fn ranges(&self) -> &[u64] {
        &self.ranges
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn min(&self) -> Option<u64> {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
