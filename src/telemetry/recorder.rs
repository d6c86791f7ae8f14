//! Append-only run record log
//!
//! One JSON line per optimization run or simulation, mirroring the logging
//! table the engine's predecessors kept. Recording is best-effort: write
//! failures are logged and swallowed, never surfaced to the run itself.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::optimizer::types::{OptimizationKind, OptimizationRun};
use crate::simulator::lru::SimulationReport;
use crate::snapshot::types::{now_ns, Snapshot};

/// One appended record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp_ns: u64,
    /// `memory`, `cache`, or `simulation`
    pub kind: String,
    /// Ratio before the run, or capacity for a simulation record
    pub ratio_before: f64,
    pub ratio_after: f64,
    pub hits: u64,
    pub misses: u64,
}

/// Appends run records as JSON lines to a log file
#[derive(Debug, Clone)]
pub struct RunRecorder {
    path: PathBuf,
}

impl RunRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record for a finished optimization run
    pub fn record_run(&self, run: &OptimizationRun) {
        let (hits, misses) = match (run.kind, &run.after) {
            (OptimizationKind::Cache, Snapshot::Cache(c)) => (c.hits, c.misses),
            _ => (0, 0),
        };
        self.append(&RunRecord {
            timestamp_ns: now_ns(),
            kind: run.kind.as_str().to_string(),
            ratio_before: run.improvement.before_ratio,
            ratio_after: run.improvement.after_ratio,
            hits,
            misses,
        });
    }

    /// Append a record for a page-access simulation
    pub fn record_simulation(&self, report: &SimulationReport) {
        self.append(&RunRecord {
            timestamp_ns: now_ns(),
            kind: "simulation".to_string(),
            ratio_before: report.capacity as f64,
            ratio_after: report.hit_ratio(),
            hits: report.hits,
            misses: report.misses,
        });
    }

    fn append(&self, record: &RunRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("failed to serialize run record: {}", e);
                return;
            }
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));

        if let Err(e) = result {
            log::warn!("failed to append run record to {}: {}", self.path.display(), e);
        }
    }
}
