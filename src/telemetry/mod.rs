//! Telemetry: improvement calculation, snapshot history, run records

pub mod history;
pub mod improvement;
pub mod recorder;

pub use history::{HistoryBuffer, HistoryEntry, HISTORY_WINDOW};
pub use improvement::{compute, Direction, ImprovementStats};
pub use recorder::{RunRecord, RunRecorder};
