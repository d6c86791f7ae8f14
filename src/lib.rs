//! Memtrim - memory & cache optimization engine
//!
//! A system remediation engine that pairs a deterministic page-access
//! simulator with a privilege-aware optimization orchestrator.
//!
//! # Features
//!
//! - **Page-access simulation**: bounded-capacity LRU and FIFO cache models
//!   with exact hit/miss accounting
//! - **Optimization orchestration**: platform- and privilege-dependent
//!   remediation strategies with immutable before/after snapshots
//! - **Failure isolation**: every remediation step outcome is captured in an
//!   append-only trail; one failing step never aborts a run
//! - **Pluggable snapshot capture**: real-OS provider backed by `sysinfo` or
//!   a deterministic fixture for tests
//! - **Background execution**: runs execute on dedicated worker threads with
//!   crossbeam channels, never blocking the caller's control thread
//! - **Trend history**: fixed 60-entry retention window over system snapshots

// Public API modules
pub mod memtrim;
pub mod prelude;

// Engine modules - traits are public for user implementations
pub mod optimizer;
pub mod simulator;
pub mod snapshot;
pub mod telemetry;

// Re-export the public API at the crate root for convenience
pub use memtrim::{Memtrim, MemtrimBuilder};
pub use optimizer::types::{OptimizationKind, OptimizationRun, OptimizerError, StepOutcome};
pub use prelude::*;
