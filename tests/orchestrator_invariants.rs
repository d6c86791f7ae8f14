// ==============================================
// ORCHESTRATOR INVARIANT TESTS (integration)
// ==============================================
//
// Cross-module behavior of the optimization orchestrator: run lifecycle,
// failure isolation, in-flight rejection, and snapshot capture semantics.
// These span orchestrator, strategy, executor, and provider and belong here
// rather than in any single source file.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

use memtrim::prelude::*;

fn memory_snapshot(used_percent: f64) -> Snapshot {
    Snapshot::Memory(MemorySnapshot {
        total_bytes: 16_000_000_000,
        used_bytes: (160_000_000.0 * used_percent) as u64,
        available_bytes: 16_000_000_000 - (160_000_000.0 * used_percent) as u64,
        used_percent,
        swap_used_percent: 0.0,
        timestamp_ns: 1,
    })
}

fn cache_snapshot(hits: u64, misses: u64) -> Snapshot {
    Snapshot::Cache(CacheSnapshot::from_counters(hits, misses))
}

/// Fixture-backed engine with elevated Linux strategies (deterministic step
/// labels: drop_caches, compact_memory, swappiness)
fn engine_with(
    provider: Arc<dyn SnapshotProvider>,
    executor: Arc<dyn StepExecutor>,
) -> Memtrim {
    Memtrim::builder()
        .snapshot_provider(provider)
        .step_executor(executor)
        .platform(Platform::Linux)
        .privilege(PrivilegeLevel::Elevated)
        .build()
}

// ==============================================
// Run Lifecycle
// ==============================================

#[test]
fn run_captures_before_after_and_full_trail() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));
    provider.push(memory_snapshot(40.0));

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    let run = engine.optimize(OptimizationKind::Memory).unwrap();

    assert!(run.success);
    assert!((run.before.ratio() - 50.0).abs() < f64::EPSILON);
    assert!((run.after.ratio() - 40.0).abs() < f64::EPSILON);

    let labels: Vec<&str> = run.trail.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["drop_caches", "compact_memory", "swappiness"]);
    assert_eq!(run.failed_steps(), 0);
}

#[test]
fn improvement_is_attached_and_caller_interprets_direction() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));
    provider.push(memory_snapshot(40.0));

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    let run = engine.optimize(OptimizationKind::Memory).unwrap();

    // Memory used percent fell 50 -> 40: the calculator reports -20%, and
    // the caller reads that as favorable on a lower-is-better metric.
    assert!((run.improvement.improvement_percent - -20.0).abs() < f64::EPSILON);
    assert!(run.improvement.favorable(Direction::LowerIsBetter));
}

#[test]
fn last_run_is_retained_on_the_instance() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(60.0));

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    assert!(engine.last_run().is_none());

    let run = engine.optimize(OptimizationKind::Memory).unwrap();
    let last = engine.last_run().unwrap();
    assert_eq!(last, run);
}

// ==============================================
// Failure Isolation (continue-on-error)
// ==============================================

#[test]
fn failing_step_is_recorded_and_run_continues() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));

    let executor = ScriptedStepExecutor::new().fail_label("drop_caches");
    let engine = engine_with(provider, Arc::new(executor));
    let run = engine.optimize(OptimizationKind::Memory).unwrap();

    assert_eq!(run.trail.len(), 3, "trail must log every step");
    assert!(run.trail[0].failed);
    assert!(!run.trail[1].failed);
    assert!(run.success, "one failing step must not fail the run");
    assert!(run.message.contains("issues"));
}

#[test]
fn run_with_all_steps_failing_reports_failure() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));

    let executor = ScriptedStepExecutor::new()
        .fail_label("drop_caches")
        .fail_label("compact_memory")
        .fail_label("swappiness");
    let engine = engine_with(provider, Arc::new(executor));
    let run = engine.optimize(OptimizationKind::Memory).unwrap();

    assert!(!run.success);
    assert_eq!(run.failed_steps(), 3);
}

#[test]
fn empty_strategy_succeeds_vacuously() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));

    let engine = Memtrim::builder()
        .snapshot_provider(provider)
        .step_executor(Arc::new(ScriptedStepExecutor::new()))
        .platform(Platform::Unsupported)
        .privilege(PrivilegeLevel::Elevated)
        .build();

    let run = engine.optimize(OptimizationKind::Memory).unwrap();
    assert!(run.success);
    assert!(run.trail.is_empty());
    assert!(run.message.contains("no memory remediation required"));
}

// ==============================================
// Snapshot Capture Semantics
// ==============================================

#[test]
fn before_capture_failure_is_fatal_and_releases_the_flag() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.fail_next(SnapshotKind::Memory);
    provider.push(memory_snapshot(50.0));

    let engine = engine_with(
        Arc::clone(&provider) as Arc<dyn SnapshotProvider>,
        Arc::new(ScriptedStepExecutor::new()),
    );

    let err = engine.optimize(OptimizationKind::Memory).unwrap_err();
    assert!(matches!(err, OptimizerError::CaptureFailed(_)));
    assert!(engine.last_run().is_none(), "no run record on fatal capture");

    // The in-flight flag must be released; a retry succeeds.
    assert!(engine.optimize(OptimizationKind::Memory).is_ok());
}

/// Delegates to an inner provider but fails one capture by call index
struct FailingNthProvider {
    inner: FixtureSnapshotProvider,
    calls: AtomicUsize,
    fail_on: usize,
}

impl SnapshotProvider for FailingNthProvider {
    fn capture(&self, kind: SnapshotKind) -> Result<Snapshot, OptimizerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            return Err(OptimizerError::CaptureFailed("scripted outage".into()));
        }
        self.inner.capture(kind)
    }
}

#[test]
fn after_capture_failure_degrades_the_run_but_returns_it() {
    let inner = FixtureSnapshotProvider::new();
    inner.push(memory_snapshot(50.0));
    let provider = Arc::new(FailingNthProvider {
        inner,
        calls: AtomicUsize::new(0),
        fail_on: 1, // the after-snapshot capture
    });

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    let run = engine.optimize(OptimizationKind::Memory).unwrap();

    assert!(!run.success);
    assert_eq!(run.after, run.before, "after falls back to before");
    let last = run.trail.last().unwrap();
    assert_eq!(last.label, "after_snapshot");
    assert!(last.failed);
    assert_eq!(run.improvement.improvement_percent, 0.0);
}

// ==============================================
// Concurrency: in-flight flags per kind
// ==============================================

/// Blocks on a gate while executing steps with a given label
struct GatedExecutor {
    gated_label: String,
    started: Sender<()>,
    gate: Mutex<Receiver<()>>,
}

impl StepExecutor for GatedExecutor {
    fn execute(&self, step: &RemediationStep) -> StepOutcome {
        if step.label == self.gated_label {
            let _ = self.started.send(());
            if let Ok(gate) = self.gate.lock() {
                let _ = gate.recv();
            }
        }
        StepOutcome::success(&step.label, "gated success")
    }
}

#[test]
fn same_kind_run_is_rejected_while_in_flight() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));

    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let executor = Arc::new(GatedExecutor {
        gated_label: "drop_caches".to_string(),
        started: started_tx,
        gate: Mutex::new(release_rx),
    });

    let engine = engine_with(provider, executor);
    let handle = engine.optimize_background(OptimizationKind::Memory).unwrap();
    started_rx.recv().unwrap();

    // Second memory run while the first is executing: rejected, no record.
    let err = engine.optimize(OptimizationKind::Memory).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::RunInProgress(OptimizationKind::Memory)
    ));
    assert!(engine.last_run().is_none());

    release_tx.send(()).unwrap();
    let run = handle.join().unwrap();
    assert!(run.success);
}

#[test]
fn different_kinds_proceed_concurrently() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));
    provider.push(cache_snapshot(80, 20));

    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let executor = Arc::new(GatedExecutor {
        gated_label: "drop_caches".to_string(), // memory-only step
        started: started_tx,
        gate: Mutex::new(release_rx),
    });

    let engine = engine_with(provider, executor);
    let memory_handle = engine.optimize_background(OptimizationKind::Memory).unwrap();
    started_rx.recv().unwrap();

    // A cache run is independent state and must not be blocked.
    let cache_run = engine.optimize(OptimizationKind::Cache).unwrap();
    assert!(cache_run.success);

    release_tx.send(()).unwrap();
    assert!(memory_handle.join().unwrap().success);
}

#[test]
fn background_handle_delivers_the_finished_run() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));
    provider.push(memory_snapshot(45.0));

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    let handle = engine.optimize_background(OptimizationKind::Memory).unwrap();
    let run = handle.join().unwrap();

    assert!(run.success);
    assert!((run.improvement.improvement_percent - -10.0).abs() < f64::EPSILON);
}

// ==============================================
// History via the facade
// ==============================================

#[test]
fn record_snapshot_pushes_one_entry_per_call() {
    let provider = Arc::new(FixtureSnapshotProvider::new());
    provider.push(memory_snapshot(50.0));
    provider.push(cache_snapshot(8, 2));
    provider.push(Snapshot::Performance(PerformanceSnapshot {
        cpu_percent: 10.0,
        load_average: 0.5,
        page_faults: 0,
        swap_used_percent: 0.0,
        timestamp_ns: 1,
    }));

    let engine = engine_with(provider, Arc::new(ScriptedStepExecutor::new()));
    assert!(engine.history().is_empty());

    let entry = engine.record_snapshot().unwrap();
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history().latest().unwrap(), entry);
    assert!((entry.cache.hit_ratio - 80.0).abs() < f64::EPSILON);
}
