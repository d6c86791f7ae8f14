//! Optimization run orchestration
//!
//! The orchestrator drives one run through its states: privilege-aware
//! strategy selection, before snapshot, ordered step execution, after
//! snapshot, improvement calculation. At most one run per kind may be in
//! flight on an orchestrator instance; memory and cache runs proceed
//! concurrently against independent flags. Snapshot capture is the only
//! fatal failure; step failures are trail entries and the run continues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use crossbeam_utils::CachePadded;

use super::privilege::{Platform, PrivilegeLevel};
use super::step::StepExecutor;
use super::strategy::select_strategy;
use super::types::{OptimizationKind, OptimizationRun, OptimizerError, StepOutcome};
use crate::snapshot::provider::SnapshotProvider;
use crate::telemetry::history::{HistoryBuffer, HistoryEntry};
use crate::telemetry::improvement;
use crate::telemetry::recorder::RunRecorder;

/// Drives optimization runs and owns the process-wide run state
///
/// The last-run record and in-flight flags live on the instance, never in
/// global state; construct one orchestrator at process start and share it by
/// `Arc`.
pub struct Orchestrator {
    provider: Arc<dyn SnapshotProvider>,
    executor: Arc<dyn StepExecutor>,
    platform: Platform,
    privilege: PrivilegeLevel,
    memory_in_flight: CachePadded<AtomicBool>,
    cache_in_flight: CachePadded<AtomicBool>,
    last_run: Mutex<Option<OptimizationRun>>,
    history: Arc<HistoryBuffer>,
    recorder: Option<Arc<RunRecorder>>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        executor: Arc<dyn StepExecutor>,
        platform: Platform,
        privilege: PrivilegeLevel,
        history: Arc<HistoryBuffer>,
        recorder: Option<Arc<RunRecorder>>,
    ) -> Self {
        Self {
            provider,
            executor,
            platform,
            privilege,
            memory_in_flight: CachePadded::new(AtomicBool::new(false)),
            cache_in_flight: CachePadded::new(AtomicBool::new(false)),
            last_run: Mutex::new(None),
            history,
            recorder,
        }
    }

    /// Execute one optimization run synchronously on the calling thread
    ///
    /// Rejects with `RunInProgress` when a run of the same kind is already
    /// executing, producing no side effects. A before-snapshot failure is
    /// fatal and surfaces as `CaptureFailed`; an after-snapshot failure
    /// yields a run record with `success = false` and `after == before`.
    pub fn run(&self, kind: OptimizationKind) -> Result<OptimizationRun, OptimizerError> {
        self.acquire(kind)?;
        let result = self.run_locked(kind);
        self.in_flight(kind).store(false, Ordering::Release);
        result
    }

    /// Execute a run on a dedicated worker thread
    ///
    /// The in-flight rejection happens before the thread spawns; the handle
    /// delivers the finished run over a bounded channel so the caller's
    /// control thread is never blocked by multi-second remediation steps.
    pub fn spawn(
        self: &Arc<Self>,
        kind: OptimizationKind,
    ) -> Result<RunHandle, OptimizerError> {
        self.acquire(kind)?;

        let (sender, receiver) = bounded(1);
        let orchestrator = Arc::clone(self);

        let spawn_result = thread::Builder::new()
            .name(format!("memtrim-{}", kind.as_str()))
            .spawn(move || {
                let result = orchestrator.run_locked(kind);
                orchestrator.in_flight(kind).store(false, Ordering::Release);
                let _ = sender.send(result);
            });

        match spawn_result {
            Ok(handle) => Ok(RunHandle {
                receiver,
                handle: Some(handle),
            }),
            Err(e) => {
                self.in_flight(kind).store(false, Ordering::Release);
                Err(OptimizerError::worker_failed(format!(
                    "could not spawn worker: {}",
                    e
                )))
            }
        }
    }

    /// Clone of the most recently completed run, if any
    pub fn last_run(&self) -> Option<OptimizationRun> {
        self.last_run.lock().ok().and_then(|guard| guard.clone())
    }

    /// Platform the orchestrator was configured with
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Privilege level the orchestrator was configured with
    pub fn privilege(&self) -> PrivilegeLevel {
        self.privilege
    }

    fn in_flight(&self, kind: OptimizationKind) -> &AtomicBool {
        match kind {
            OptimizationKind::Memory => &self.memory_in_flight,
            OptimizationKind::Cache => &self.cache_in_flight,
        }
    }

    fn acquire(&self, kind: OptimizationKind) -> Result<(), OptimizerError> {
        self.in_flight(kind)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OptimizerError::RunInProgress(kind))?;
        Ok(())
    }

    /// Run body; caller holds the kind's in-flight flag
    fn run_locked(&self, kind: OptimizationKind) -> Result<OptimizationRun, OptimizerError> {
        log::info!(
            "starting {} optimization ({}, {} privileges)",
            kind,
            self.platform.as_str(),
            self.privilege.as_str()
        );

        let before = self.provider.capture(kind.snapshot_kind()).map_err(|e| {
            log::error!("{} run aborted, before-snapshot capture failed: {}", kind, e);
            e
        })?;

        let strategy = select_strategy(kind, self.platform, self.privilege);
        log::info!(
            "selected strategy {} with {} steps",
            strategy.name,
            strategy.steps.len()
        );

        let mut trail: Vec<StepOutcome> = Vec::with_capacity(strategy.steps.len());
        for step in &strategy.steps {
            let outcome = self.executor.execute(step);
            if outcome.failed {
                log::warn!("step {} failed: {}", outcome.label, outcome.detail);
            } else {
                log::debug!("step {} succeeded: {}", outcome.label, outcome.detail);
            }
            trail.push(outcome);
        }

        let (after, after_capture_failed) = match self.provider.capture(kind.snapshot_kind()) {
            Ok(snapshot) => (snapshot, false),
            Err(e) => {
                log::error!("{} run degraded, after-snapshot capture failed: {}", kind, e);
                trail.push(StepOutcome::failure("after_snapshot", e.to_string()));
                (before, true)
            }
        };

        let succeeded = trail.iter().filter(|o| !o.failed).count();
        let failed = trail.len() - succeeded;
        let success = !after_capture_failed && (strategy.steps.is_empty() || succeeded > 0);

        let message = if after_capture_failed {
            format!("{} optimization failed: after-snapshot capture error", kind)
        } else if strategy.steps.is_empty() {
            format!("no {} remediation required for this platform", kind)
        } else if failed == 0 {
            format!("{} optimization completed: {} steps succeeded", kind, succeeded)
        } else if succeeded > 0 {
            format!(
                "{} optimization completed with issues: {} succeeded, {} failed",
                kind, succeeded, failed
            )
        } else {
            format!("{} optimization failed: all {} steps failed", kind, failed)
        };

        let run = OptimizationRun {
            kind,
            before,
            after,
            trail,
            success,
            message,
            improvement: improvement::compute(before.ratio(), after.ratio()),
        };

        if let Ok(mut last) = self.last_run.lock() {
            *last = Some(run.clone());
        }
        if let Some(recorder) = &self.recorder {
            recorder.record_run(&run);
        }
        self.push_history();

        log::info!("{}", run.message);
        Ok(run)
    }

    /// Append a post-run history entry, best-effort
    fn push_history(&self) {
        match HistoryEntry::capture(self.provider.as_ref()) {
            Ok(entry) => self.history.push(entry),
            Err(e) => log::debug!("skipping history entry: {}", e),
        }
    }
}

/// Handle to a run executing on a worker thread
pub struct RunHandle {
    receiver: Receiver<Result<OptimizationRun, OptimizerError>>,
    handle: Option<JoinHandle<()>>,
}

impl RunHandle {
    /// Block until the worker finishes and return its result
    pub fn join(mut self) -> Result<OptimizationRun, OptimizerError> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| OptimizerError::worker_failed("worker exited without a result"))?;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        result
    }

    /// Non-blocking poll for the result
    pub fn try_result(&self) -> Option<Result<OptimizationRun, OptimizerError>> {
        self.receiver.try_recv().ok()
    }
}
