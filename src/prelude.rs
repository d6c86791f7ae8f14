//! Memtrim prelude - convenient imports for users
//!
//! Everything needed to run optimizations, capture snapshots, and drive the
//! page-access simulator.

// Public API
pub use crate::memtrim::{Memtrim, MemtrimBuilder};

// Run types and errors
pub use crate::optimizer::types::{
    OptimizationKind, OptimizationRun, OptimizerError, StepOutcome,
};

// Orchestration surface
pub use crate::optimizer::orchestrator::{Orchestrator, RunHandle};
pub use crate::optimizer::privilege::{
    detect_platform, detect_privilege, Platform, PrivilegeLevel,
};
pub use crate::optimizer::step::{
    RemediationStep, ScriptedStepExecutor, ShellStepExecutor, StepAction, StepExecutor,
};
pub use crate::optimizer::strategy::{select_strategy, RemediationStrategy};

// Snapshot values and providers
pub use crate::snapshot::provider::{
    FixtureSnapshotProvider, SnapshotProvider, SystemSnapshotProvider,
};
pub use crate::snapshot::types::{
    CacheSnapshot, MemorySnapshot, PerformanceSnapshot, Snapshot, SnapshotKind,
};

// Simulation
pub use crate::simulator::lru::{
    simulate, simulate_fifo, AccessResult, LruCache, PageId, SimulationReport,
};

// Telemetry
pub use crate::telemetry::history::{HistoryBuffer, HistoryEntry, HISTORY_WINDOW};
pub use crate::telemetry::improvement::{Direction, ImprovementStats};
pub use crate::telemetry::recorder::{RunRecord, RunRecorder};
