//! Simple public API for the memtrim optimization engine
//!
//! Wires a snapshot provider, a step executor, and the detected platform and
//! privilege level into one orchestrator with a shared trend history. The
//! provider and executor are always caller-visible choices; the engine never
//! silently substitutes one.

use std::path::PathBuf;
use std::sync::Arc;

use crate::optimizer::orchestrator::{Orchestrator, RunHandle};
use crate::optimizer::privilege::{detect_platform, detect_privilege, Platform, PrivilegeLevel};
use crate::optimizer::step::{ShellStepExecutor, StepExecutor};
use crate::optimizer::types::{OptimizationKind, OptimizationRun, OptimizerError};
use crate::simulator::lru::{self, PageId, SimulationReport};
use crate::snapshot::provider::{SnapshotProvider, SystemSnapshotProvider};
use crate::snapshot::types::{Snapshot, SnapshotKind};
use crate::telemetry::history::{HistoryBuffer, HistoryEntry};
use crate::telemetry::recorder::RunRecorder;

/// Builder for [`Memtrim`]
///
/// Defaults: real-OS snapshot provider, shell step executor, detected
/// platform and privilege, no run recording.
#[derive(Default)]
pub struct MemtrimBuilder {
    provider: Option<Arc<dyn SnapshotProvider>>,
    executor: Option<Arc<dyn StepExecutor>>,
    platform: Option<Platform>,
    privilege: Option<PrivilegeLevel>,
    recorder_path: Option<PathBuf>,
}

impl MemtrimBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific snapshot provider (e.g. a fixture in tests)
    pub fn snapshot_provider(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a specific step executor (e.g. a scripted one in tests)
    pub fn step_executor(mut self, executor: Arc<dyn StepExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Override platform detection
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Override privilege detection
    pub fn privilege(mut self, privilege: PrivilegeLevel) -> Self {
        self.privilege = Some(privilege);
        self
    }

    /// Append a JSON-lines record per run and simulation to `path`
    pub fn record_runs_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.recorder_path = Some(path.into());
        self
    }

    pub fn build(self) -> Memtrim {
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(SystemSnapshotProvider::new()));
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(ShellStepExecutor::new()));
        let platform = self.platform.unwrap_or_else(detect_platform);
        let privilege = self.privilege.unwrap_or_else(detect_privilege);
        let history = Arc::new(HistoryBuffer::new());
        let recorder = self.recorder_path.map(|path| Arc::new(RunRecorder::new(path)));

        log::info!(
            "memtrim initialized ({}, {} privileges)",
            platform.as_str(),
            privilege.as_str()
        );

        Memtrim {
            orchestrator: Arc::new(Orchestrator::new(
                Arc::clone(&provider),
                executor,
                platform,
                privilege,
                Arc::clone(&history),
                recorder.clone(),
            )),
            provider,
            history,
            recorder,
        }
    }
}

/// Memory & cache optimization engine
///
/// Construct once at process start and share; the orchestrator's in-flight
/// flags and last-run record are instance state, reset on process restart.
pub struct Memtrim {
    orchestrator: Arc<Orchestrator>,
    provider: Arc<dyn SnapshotProvider>,
    history: Arc<HistoryBuffer>,
    recorder: Option<Arc<RunRecorder>>,
}

impl Memtrim {
    pub fn builder() -> MemtrimBuilder {
        MemtrimBuilder::new()
    }

    /// Run an optimization synchronously on the calling thread
    pub fn optimize(&self, kind: OptimizationKind) -> Result<OptimizationRun, OptimizerError> {
        self.orchestrator.run(kind)
    }

    /// Run an optimization on a dedicated worker thread
    pub fn optimize_background(
        &self,
        kind: OptimizationKind,
    ) -> Result<RunHandle, OptimizerError> {
        self.orchestrator.spawn(kind)
    }

    /// Capture a single snapshot of the requested kind
    pub fn snapshot(&self, kind: SnapshotKind) -> Result<Snapshot, OptimizerError> {
        self.provider.capture(kind)
    }

    /// Capture all three snapshot kinds and push them into the history
    pub fn record_snapshot(&self) -> Result<HistoryEntry, OptimizerError> {
        let entry = HistoryEntry::capture(self.provider.as_ref())?;
        self.history.push(entry);
        Ok(entry)
    }

    /// Shared trend history
    pub fn history(&self) -> Arc<HistoryBuffer> {
        Arc::clone(&self.history)
    }

    /// Most recently completed run, if any
    pub fn last_run(&self) -> Option<OptimizationRun> {
        self.orchestrator.last_run()
    }

    /// Replay an access sequence through an LRU cache, recording the report
    pub fn simulate_lru(
        &self,
        capacity: usize,
        pages: &[PageId],
    ) -> Result<SimulationReport, OptimizerError> {
        let report = lru::simulate(capacity, pages)?;
        if let Some(recorder) = &self.recorder {
            recorder.record_simulation(&report);
        }
        Ok(report)
    }

    /// Replay an access sequence through a FIFO cache, recording the report
    pub fn simulate_fifo(
        &self,
        capacity: usize,
        pages: &[PageId],
    ) -> Result<SimulationReport, OptimizerError> {
        let report = lru::simulate_fifo(capacity, pages)?;
        if let Some(recorder) = &self.recorder {
            recorder.record_simulation(&report);
        }
        Ok(report)
    }
}
