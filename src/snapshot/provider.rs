//! Snapshot provider capability
//!
//! The engine never decides how metrics are collected; callers hand it a
//! `SnapshotProvider`. Two implementations ship with the crate: a real-OS
//! provider backed by `sysinfo` and a deterministic fixture for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use sysinfo::System;

use super::types::{
    now_ns, CacheSnapshot, MemorySnapshot, PerformanceSnapshot, Snapshot, SnapshotKind,
};
use crate::optimizer::types::OptimizerError;

/// Capability that yields an immutable snapshot on demand
///
/// Implementations must be safe to call from worker threads; the
/// orchestrator captures from the thread a run executes on.
pub trait SnapshotProvider: Send + Sync {
    /// Capture a snapshot of the requested kind
    ///
    /// Fails with `OptimizerError::CaptureFailed` on underlying I/O failure.
    fn capture(&self, kind: SnapshotKind) -> Result<Snapshot, OptimizerError>;
}

/// Real-OS snapshot provider backed by `sysinfo`
///
/// Cache hit/miss counters are not exposed portably by any OS; the cache
/// snapshot is derived from memory pressure (available vs. total), which
/// tracks page-cache headroom closely enough for before/after comparison.
pub struct SystemSnapshotProvider {
    sys: Mutex<System>,
}

impl SystemSnapshotProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu();
        Self {
            sys: Mutex::new(sys),
        }
    }

    fn swap_used_percent(sys: &System) -> f64 {
        let total = sys.total_swap();
        if total > 0 {
            sys.used_swap() as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Cumulative page faults since boot, where the OS exposes them
    #[cfg(target_os = "linux")]
    fn page_faults() -> u64 {
        std::fs::read_to_string("/proc/vmstat")
            .ok()
            .and_then(|contents| {
                contents.lines().find_map(|line| {
                    line.strip_prefix("pgfault ")
                        .and_then(|v| v.trim().parse::<u64>().ok())
                })
            })
            .unwrap_or(0)
    }

    #[cfg(not(target_os = "linux"))]
    fn page_faults() -> u64 {
        0
    }
}

impl Default for SystemSnapshotProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProvider for SystemSnapshotProvider {
    fn capture(&self, kind: SnapshotKind) -> Result<Snapshot, OptimizerError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| OptimizerError::capture_failed("snapshot state poisoned"))?;

        let snapshot = match kind {
            SnapshotKind::Memory => {
                sys.refresh_memory();
                Snapshot::Memory(MemorySnapshot::from_counters(
                    sys.total_memory(),
                    sys.used_memory(),
                    sys.available_memory(),
                    Self::swap_used_percent(&sys),
                ))
            }
            SnapshotKind::Cache => {
                sys.refresh_memory();
                // Megabyte-granular counters keep the synthetic hit/miss
                // split readable in run records.
                let mb = 1024 * 1024;
                let hits = sys.available_memory() / mb;
                let misses = sys.used_memory() / mb;
                Snapshot::Cache(CacheSnapshot::from_counters(hits, misses))
            }
            SnapshotKind::Performance => {
                sys.refresh_cpu();
                sys.refresh_memory();
                Snapshot::Performance(PerformanceSnapshot {
                    cpu_percent: sys.global_cpu_info().cpu_usage() as f64,
                    load_average: System::load_average().one,
                    page_faults: Self::page_faults(),
                    swap_used_percent: Self::swap_used_percent(&sys),
                    timestamp_ns: now_ns(),
                })
            }
        };

        log::debug!(
            "captured {} snapshot (ratio {:.2})",
            kind,
            snapshot.ratio()
        );
        Ok(snapshot)
    }
}

/// Deterministic snapshot provider for tests
///
/// Scripted snapshots are consumed in push order per kind; once a kind's
/// queue drains, the last consumed snapshot is repeated. A kind can be armed
/// to fail its next capture exactly once.
#[derive(Default)]
pub struct FixtureSnapshotProvider {
    scripted: Mutex<HashMap<SnapshotKind, VecDeque<Snapshot>>>,
    last_served: Mutex<HashMap<SnapshotKind, Snapshot>>,
    armed_failures: Mutex<HashSet<SnapshotKind>>,
}

impl FixtureSnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a scripted snapshot, keyed by its own kind
    pub fn push(&self, snapshot: Snapshot) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.entry(snapshot.kind()).or_default().push_back(snapshot);
        }
    }

    /// Arm the next capture of `kind` to fail, one-shot
    pub fn fail_next(&self, kind: SnapshotKind) {
        if let Ok(mut armed) = self.armed_failures.lock() {
            armed.insert(kind);
        }
    }
}

impl SnapshotProvider for FixtureSnapshotProvider {
    fn capture(&self, kind: SnapshotKind) -> Result<Snapshot, OptimizerError> {
        if let Ok(mut armed) = self.armed_failures.lock() {
            if armed.remove(&kind) {
                return Err(OptimizerError::capture_failed(format!(
                    "scripted {} capture failure",
                    kind
                )));
            }
        }

        let scripted_next = self
            .scripted
            .lock()
            .ok()
            .and_then(|mut scripted| scripted.get_mut(&kind).and_then(|queue| queue.pop_front()));

        if let Some(snapshot) = scripted_next {
            if let Ok(mut last) = self.last_served.lock() {
                last.insert(kind, snapshot);
            }
            return Ok(snapshot);
        }

        self.last_served
            .lock()
            .ok()
            .and_then(|last| last.get(&kind).copied())
            .ok_or_else(|| {
                OptimizerError::capture_failed(format!("no scripted {} snapshot", kind))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_snapshot(used_percent: f64) -> Snapshot {
        Snapshot::Memory(MemorySnapshot {
            total_bytes: 1000,
            used_bytes: (used_percent * 10.0) as u64,
            available_bytes: 1000 - (used_percent * 10.0) as u64,
            used_percent,
            swap_used_percent: 0.0,
            timestamp_ns: now_ns(),
        })
    }

    #[test]
    fn fixture_serves_scripted_then_repeats_last() {
        let provider = FixtureSnapshotProvider::new();
        provider.push(memory_snapshot(50.0));
        provider.push(memory_snapshot(40.0));

        let first = provider.capture(SnapshotKind::Memory).unwrap();
        let second = provider.capture(SnapshotKind::Memory).unwrap();
        let third = provider.capture(SnapshotKind::Memory).unwrap();

        assert!((first.ratio() - 50.0).abs() < f64::EPSILON);
        assert!((second.ratio() - 40.0).abs() < f64::EPSILON);
        assert_eq!(second, third);
    }

    #[test]
    fn fixture_without_script_fails_capture() {
        let provider = FixtureSnapshotProvider::new();
        let err = provider.capture(SnapshotKind::Cache).unwrap_err();
        assert!(matches!(err, OptimizerError::CaptureFailed(_)));
    }

    #[test]
    fn armed_failure_fires_once() {
        let provider = FixtureSnapshotProvider::new();
        provider.push(memory_snapshot(30.0));
        provider.fail_next(SnapshotKind::Memory);

        assert!(provider.capture(SnapshotKind::Memory).is_err());
        assert!(provider.capture(SnapshotKind::Memory).is_ok());
    }

    #[test]
    fn system_provider_captures_all_kinds() {
        let provider = SystemSnapshotProvider::new();
        for kind in [
            SnapshotKind::Memory,
            SnapshotKind::Cache,
            SnapshotKind::Performance,
        ] {
            let snapshot = provider.capture(kind).unwrap();
            assert_eq!(snapshot.kind(), kind);
        }
    }
}
