//! Normalized before/after improvement calculation
//!
//! Pure arithmetic over a pair of scalar ratios. The calculator is
//! sign-agnostic: it reports relative change and leaves interpretation to
//! the caller, which knows whether the metric is lower- or higher-is-better.

use serde::{Deserialize, Serialize};

/// How a caller reads the sign of an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Metric improves as it falls (e.g. memory used percent)
    LowerIsBetter,
    /// Metric improves as it rises (e.g. cache hit ratio)
    HigherIsBetter,
}

/// Normalized percentage-change record for one (before, after) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImprovementStats {
    pub before_ratio: f64,
    pub after_ratio: f64,
    /// Relative change in percent, rounded to two decimals; exactly 0 when
    /// `before_ratio` is 0 (division guard, not an error)
    pub improvement_percent: f64,
}

impl ImprovementStats {
    /// Caller-side reading of the sign for a known metric direction
    pub fn favorable(&self, direction: Direction) -> bool {
        match direction {
            Direction::LowerIsBetter => self.improvement_percent < 0.0,
            Direction::HigherIsBetter => self.improvement_percent > 0.0,
        }
    }
}

/// Compute the relative change from `before_ratio` to `after_ratio`
pub fn compute(before_ratio: f64, after_ratio: f64) -> ImprovementStats {
    let improvement_percent = if before_ratio > 0.0 {
        let raw = (after_ratio - before_ratio) / before_ratio * 100.0;
        (raw * 100.0).round() / 100.0
    } else {
        0.0
    };

    ImprovementStats {
        before_ratio,
        after_ratio,
        improvement_percent,
    }
}
