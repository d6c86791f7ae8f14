//! Snapshot values and the provider capability
//!
//! Snapshots are immutable, timestamped captures of system metrics. The
//! engine consumes them through the `SnapshotProvider` trait and never
//! chooses a collection mechanism itself.

pub mod provider;
pub mod types;

pub use provider::{FixtureSnapshotProvider, SnapshotProvider, SystemSnapshotProvider};
pub use types::{
    now_ns, CacheSnapshot, MemorySnapshot, PerformanceSnapshot, Snapshot, SnapshotKind,
};
