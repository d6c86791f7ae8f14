//! Optimization run types and error handling
//!
//! Canonical location for the crate error enum, the run kind tag, and the
//! result records an optimization run produces. Step outcomes are plain
//! values here, never errors: a failing remediation step is recorded in the
//! run's trail and the run continues.

use serde::{Deserialize, Serialize};

use crate::snapshot::types::{Snapshot, SnapshotKind};
use crate::telemetry::improvement::ImprovementStats;

/// Kind of optimization run requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationKind {
    /// System memory remediation (working sets, temp files, swappiness)
    Memory,
    /// System cache remediation (resolver caches, page cache, browser caches)
    Cache,
}

impl OptimizationKind {
    /// Snapshot kind captured before and after a run of this kind
    pub fn snapshot_kind(&self) -> SnapshotKind {
        match self {
            OptimizationKind::Memory => SnapshotKind::Memory,
            OptimizationKind::Cache => SnapshotKind::Cache,
        }
    }

    /// Stable lowercase name for logs and run records
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationKind::Memory => "memory",
            OptimizationKind::Cache => "cache",
        }
    }
}

impl std::fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one remediation step
///
/// Appended to a run's trail in execution order and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step label, stable across platforms (e.g. `drop_caches`)
    pub label: String,
    /// Human-readable result or failure cause
    pub detail: String,
    /// Whether the underlying action failed
    pub failed: bool,
}

impl StepOutcome {
    /// Successful step outcome
    pub fn success(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
            failed: false,
        }
    }

    /// Failed step outcome carrying the cause in `detail`
    pub fn failure(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
            failed: true,
        }
    }
}

/// Fully populated record of one optimization run
///
/// Created at the start of `Orchestrator::run` and immutable once returned.
/// The orchestrator keeps a clone of the latest run for later display; the
/// returned value is exclusively owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    /// Kind of run this record describes
    pub kind: OptimizationKind,
    /// Snapshot captured before any step executed
    pub before: Snapshot,
    /// Snapshot captured after the last step (equals `before` when the
    /// after-capture itself failed)
    pub after: Snapshot,
    /// Ordered, append-only log of step outcomes
    pub trail: Vec<StepOutcome>,
    /// True when at least one step succeeded, or the strategy was empty
    pub success: bool,
    /// Summary of success or partial failure
    pub message: String,
    /// Normalized before/after change of the kind's scalar ratio
    pub improvement: ImprovementStats,
}

impl OptimizationRun {
    /// Count of steps that completed successfully
    pub fn succeeded_steps(&self) -> usize {
        self.trail.iter().filter(|o| !o.failed).count()
    }

    /// Count of steps that failed
    pub fn failed_steps(&self) -> usize {
        self.trail.iter().filter(|o| o.failed).count()
    }
}

/// Optimizer error types - canonical crate-wide error enum
///
/// Step failures are deliberately absent: they are `StepOutcome` trail
/// values, not errors. Everything here always surfaces to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// Non-positive cache capacity rejected at construction, never clamped
    InvalidCapacity(usize),
    /// Snapshot acquisition failed; fatal to the run that requested it
    CaptureFailed(String),
    /// A run of the same kind is already executing on this orchestrator
    RunInProgress(OptimizationKind),
    /// History buffer read before any entry exists
    EmptyHistory,
    /// Background worker could not be spawned or delivered no result
    WorkerFailed(String),
}

impl std::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerError::InvalidCapacity(capacity) => {
                write!(f, "Invalid cache capacity: {}", capacity)
            }
            OptimizerError::CaptureFailed(msg) => write!(f, "Snapshot capture failed: {}", msg),
            OptimizerError::RunInProgress(kind) => {
                write!(f, "A {} optimization run is already in progress", kind)
            }
            OptimizerError::EmptyHistory => write!(f, "History buffer is empty"),
            OptimizerError::WorkerFailed(msg) => write!(f, "Worker failed: {}", msg),
        }
    }
}

impl std::error::Error for OptimizerError {}

impl OptimizerError {
    /// Create capture failure error
    #[inline(always)]
    pub fn capture_failed(msg: impl Into<String>) -> Self {
        Self::CaptureFailed(msg.into())
    }

    /// Create worker failure error
    #[inline(always)]
    pub fn worker_failed(msg: impl Into<String>) -> Self {
        Self::WorkerFailed(msg.into())
    }

    /// Check if a retry can reasonably succeed without caller intervention
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            OptimizerError::CaptureFailed(_) | OptimizerError::RunInProgress(_)
        )
    }
}
