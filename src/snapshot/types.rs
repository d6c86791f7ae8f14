//! Immutable snapshot value types
//!
//! A snapshot captures scalar system metrics at one instant, tagged with a
//! nanosecond timestamp. The engine never mutates a snapshot after creation;
//! it only reads fields to compute before/after deltas.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanoseconds since the unix epoch, used as the capture timestamp
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Snapshot kind requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    Memory,
    Cache,
    Performance,
}

impl SnapshotKind {
    /// Stable lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Memory => "memory",
            SnapshotKind::Cache => "cache",
            SnapshotKind::Performance => "performance",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System memory counters at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Total physical memory in bytes
    pub total_bytes: u64,
    /// Memory in use in bytes
    pub used_bytes: u64,
    /// Memory available to new allocations in bytes
    pub available_bytes: u64,
    /// Used fraction of physical memory, 0.0..=100.0 (lower is better)
    pub used_percent: f64,
    /// Used fraction of swap, 0.0..=100.0
    pub swap_used_percent: f64,
    /// Capture timestamp
    pub timestamp_ns: u64,
}

impl MemorySnapshot {
    /// Build a snapshot from raw byte counters, deriving `used_percent`
    pub fn from_counters(
        total_bytes: u64,
        used_bytes: u64,
        available_bytes: u64,
        swap_used_percent: f64,
    ) -> Self {
        let used_percent = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_bytes,
            used_bytes,
            available_bytes,
            used_percent,
            swap_used_percent,
            timestamp_ns: now_ns(),
        }
    }
}

/// Cache hit/miss counters at one instant
///
/// Real OS caches do not expose portable hit counters; providers are free to
/// derive these heuristically. The engine treats the values as opaque and
/// only compares `hit_ratio` across captures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Accesses served from cache
    pub hits: u64,
    /// Accesses that required a fetch
    pub misses: u64,
    /// Hit fraction, 0.0..=100.0 (higher is better)
    pub hit_ratio: f64,
    /// Capture timestamp
    pub timestamp_ns: u64,
}

impl CacheSnapshot {
    /// Build a snapshot from hit/miss counters, deriving `hit_ratio`
    pub fn from_counters(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_ratio = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            hits,
            misses,
            hit_ratio,
            timestamp_ns: now_ns(),
        }
    }
}

/// Broad system load counters at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Global CPU utilization, 0.0..=100.0
    pub cpu_percent: f64,
    /// One-minute load average
    pub load_average: f64,
    /// Cumulative page faults since boot (0 where not exposed)
    pub page_faults: u64,
    /// Used fraction of swap, 0.0..=100.0
    pub swap_used_percent: f64,
    /// Capture timestamp
    pub timestamp_ns: u64,
}

/// Tagged snapshot value produced by a `SnapshotProvider`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    Memory(MemorySnapshot),
    Cache(CacheSnapshot),
    Performance(PerformanceSnapshot),
}

impl Snapshot {
    /// Kind tag of this snapshot
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Snapshot::Memory(_) => SnapshotKind::Memory,
            Snapshot::Cache(_) => SnapshotKind::Cache,
            Snapshot::Performance(_) => SnapshotKind::Performance,
        }
    }

    /// Scalar ratio the improvement calculator consumes
    ///
    /// Memory: used percent (lower is better). Cache: hit ratio (higher is
    /// better). Performance: CPU percent. The calculator itself is
    /// sign-agnostic; callers interpret the direction.
    pub fn ratio(&self) -> f64 {
        match self {
            Snapshot::Memory(m) => m.used_percent,
            Snapshot::Cache(c) => c.hit_ratio,
            Snapshot::Performance(p) => p.cpu_percent,
        }
    }

    /// Capture timestamp
    pub fn timestamp_ns(&self) -> u64 {
        match self {
            Snapshot::Memory(m) => m.timestamp_ns,
            Snapshot::Cache(c) => c.timestamp_ns,
            Snapshot::Performance(p) => p.timestamp_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_used_percent_derived_from_counters() {
        let snap = MemorySnapshot::from_counters(1000, 250, 750, 0.0);
        assert!((snap.used_percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_total_memory_yields_zero_percent() {
        let snap = MemorySnapshot::from_counters(0, 0, 0, 0.0);
        assert_eq!(snap.used_percent, 0.0);
    }

    #[test]
    fn cache_ratio_derived_from_counters() {
        let snap = CacheSnapshot::from_counters(3, 1);
        assert!((snap.hit_ratio - 75.0).abs() < f64::EPSILON);

        let empty = CacheSnapshot::from_counters(0, 0);
        assert_eq!(empty.hit_ratio, 0.0);
    }

    #[test]
    fn snapshot_ratio_selects_kind_metric() {
        let mem = Snapshot::Memory(MemorySnapshot::from_counters(100, 50, 50, 0.0));
        assert!((mem.ratio() - 50.0).abs() < f64::EPSILON);
        assert_eq!(mem.kind(), SnapshotKind::Memory);

        let cache = Snapshot::Cache(CacheSnapshot::from_counters(1, 1));
        assert!((cache.ratio() - 50.0).abs() < f64::EPSILON);
        assert_eq!(cache.kind(), SnapshotKind::Cache);
    }
}
