//! Snapshot history with fixed retention window
//!
//! Bounded ring of recent (memory, cache, performance) snapshot triples used
//! for trend display. Retention is FIFO: the oldest entries are dropped
//! first on overflow. A single mutex around push/read suffices for the at
//! most two producers (memory-kind and cache-kind runs) plus monitor reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use arrayvec::ArrayVec;
use crossbeam_utils::CachePadded;

use crate::optimizer::types::OptimizerError;
use crate::snapshot::provider::SnapshotProvider;
use crate::snapshot::types::{
    now_ns, CacheSnapshot, MemorySnapshot, PerformanceSnapshot, Snapshot, SnapshotKind,
};

/// Fixed retention window: one minute of entries at one-second sampling
pub const HISTORY_WINDOW: usize = 60;

/// One history entry: all three snapshot kinds captured together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub memory: MemorySnapshot,
    pub cache: CacheSnapshot,
    pub performance: PerformanceSnapshot,
    pub timestamp_ns: u64,
}

impl HistoryEntry {
    /// Capture all three kinds from `provider` into one entry
    pub fn capture(provider: &dyn SnapshotProvider) -> Result<Self, OptimizerError> {
        let memory = match provider.capture(SnapshotKind::Memory)? {
            Snapshot::Memory(m) => m,
            other => return Err(mismatch(SnapshotKind::Memory, other)),
        };
        let cache = match provider.capture(SnapshotKind::Cache)? {
            Snapshot::Cache(c) => c,
            other => return Err(mismatch(SnapshotKind::Cache, other)),
        };
        let performance = match provider.capture(SnapshotKind::Performance)? {
            Snapshot::Performance(p) => p,
            other => return Err(mismatch(SnapshotKind::Performance, other)),
        };

        Ok(Self {
            memory,
            cache,
            performance,
            timestamp_ns: now_ns(),
        })
    }
}

fn mismatch(requested: SnapshotKind, got: Snapshot) -> OptimizerError {
    OptimizerError::capture_failed(format!(
        "provider returned {} snapshot for {} request",
        got.kind(),
        requested
    ))
}

/// Bounded ring of recent history entries
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    entries: Mutex<ArrayVec<HistoryEntry, HISTORY_WINDOW>>,
    /// Total pushes over the buffer's lifetime
    total_pushed: CachePadded<AtomicU64>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, dropping the oldest when the window is full
    pub fn push(&self, entry: HistoryEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            while entries.len() >= HISTORY_WINDOW {
                entries.remove(0);
            }
            entries.push(entry);
        }
        self.total_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Most recent entry
    pub fn latest(&self) -> Result<HistoryEntry, OptimizerError> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.last().copied())
            .ok_or(OptimizerError::EmptyHistory)
    }

    /// Up to `count` most recent entries, oldest first
    pub fn recent(&self, count: usize) -> Vec<HistoryEntry> {
        match self.entries.lock() {
            Ok(entries) => {
                let start = entries.len().saturating_sub(count);
                entries[start..].to_vec()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Entries currently retained
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total pushes over the buffer's lifetime, including dropped entries
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed.load(Ordering::Relaxed)
    }

    /// Drop all retained entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
