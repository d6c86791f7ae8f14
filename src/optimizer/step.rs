//! Remediation steps and their executor
//!
//! A step is one best-effort remediation action. The executor is a hard
//! failure boundary: any underlying error (permission denied, command not
//! found, resource busy) becomes a `StepOutcome` with `failed: true` and
//! never propagates, so the orchestrator's trail stays a complete,
//! append-only log regardless of individual step health.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::optimizer::types::StepOutcome;

/// Default cap on files removed per stale-file cleanup step
pub const DEFAULT_MAX_STALE_FILES: usize = 50;

/// Action a remediation step performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Invoke an OS command and require a zero exit status
    Command { program: String, args: Vec<String> },
    /// Delete the oldest regular files in a directory, capped per step
    ClearStaleFiles { dir: PathBuf, max_files: usize },
    /// Clear a directory's contents (files and subtrees), keeping the
    /// directory itself
    ClearDirectory { dir: PathBuf },
    /// Release unused allocator pages back to the OS
    CollectGarbage,
}

/// One remediation action with stable labeling for the trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationStep {
    /// Stable label recorded in the trail (e.g. `drop_caches`)
    pub label: String,
    /// What the step does, for display
    pub description: String,
    /// The action to perform
    pub action: StepAction,
}

impl RemediationStep {
    pub fn command(
        label: impl Into<String>,
        description: impl Into<String>,
        program: impl Into<String>,
        args: &[&str],
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            action: StepAction::Command {
                program: program.into(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    /// Shell one-liner, for pipelines and redirections
    pub fn shell(
        label: impl Into<String>,
        description: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self::command(label, description, "sh", &["-c", &script.into()])
    }

    pub fn clear_stale_files(
        label: impl Into<String>,
        description: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            action: StepAction::ClearStaleFiles {
                dir: dir.into(),
                max_files: DEFAULT_MAX_STALE_FILES,
            },
        }
    }

    pub fn clear_directory(
        label: impl Into<String>,
        description: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            action: StepAction::ClearDirectory { dir: dir.into() },
        }
    }

    pub fn collect_garbage(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            action: StepAction::CollectGarbage,
        }
    }
}

/// Runs one remediation step and reports a labeled outcome
///
/// Implementations never propagate an error to the caller.
pub trait StepExecutor: Send + Sync {
    fn execute(&self, step: &RemediationStep) -> StepOutcome;
}

/// Real executor backed by `std::process::Command` and `std::fs`
#[derive(Debug, Default)]
pub struct ShellStepExecutor;

impl ShellStepExecutor {
    pub fn new() -> Self {
        Self
    }

    fn run_command(&self, program: &str, args: &[String]) -> Result<String, String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("failed to launch {}: {}", program, e))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stdout = stdout.trim();
            if stdout.is_empty() {
                Ok(format!("{} completed", program))
            } else {
                Ok(stdout.to_string())
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            ))
        }
    }

    /// Delete the oldest regular files in `dir`, up to `max_files`
    ///
    /// Files that cannot be deleted (locked, permission) are skipped; a
    /// missing directory clears nothing and is not a failure.
    fn clear_stale_files(&self, dir: &Path, max_files: usize) -> Result<String, String> {
        if !dir.is_dir() {
            return Ok(format!("{} not present, nothing to clear", dir.display()));
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read {}: {}", dir.display(), e))?;

        let mut files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    files.push((path, modified));
                }
            }
        }

        // Oldest first
        files.sort_by_key(|(_, modified)| *modified);

        let mut cleared = 0usize;
        for (path, _) in files.into_iter().take(max_files) {
            if std::fs::remove_file(&path).is_ok() {
                cleared += 1;
            }
        }

        Ok(format!("cleared {} stale files from {}", cleared, dir.display()))
    }

    /// Remove a directory's contents without removing the directory
    fn clear_directory(&self, dir: &Path) -> Result<String, String> {
        if !dir.is_dir() {
            return Ok(format!("{} not present, nothing to clear", dir.display()));
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read {}: {}", dir.display(), e))?;

        let mut cleared = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path).is_ok()
            } else {
                std::fs::remove_file(&path).is_ok()
            };
            if removed {
                cleared += 1;
            }
        }

        Ok(format!("cleared {} entries from {}", cleared, dir.display()))
    }

    fn collect_garbage(&self) -> Result<String, String> {
        #[cfg(target_os = "linux")]
        {
            // malloc_trim returns 1 when memory was released to the OS
            let released = unsafe { libc::malloc_trim(0) };
            if released == 1 {
                return Ok("released unused allocator pages".to_string());
            }
            return Ok("no allocator pages to release".to_string());
        }
        #[cfg(not(target_os = "linux"))]
        Ok("allocator trim not supported on this platform".to_string())
    }
}

impl StepExecutor for ShellStepExecutor {
    fn execute(&self, step: &RemediationStep) -> StepOutcome {
        log::debug!("executing step {}: {}", step.label, step.description);

        let result = match &step.action {
            StepAction::Command { program, args } => self.run_command(program, args),
            StepAction::ClearStaleFiles { dir, max_files } => {
                self.clear_stale_files(dir, *max_files)
            }
            StepAction::ClearDirectory { dir } => self.clear_directory(dir),
            StepAction::CollectGarbage => self.collect_garbage(),
        };

        match result {
            Ok(detail) => StepOutcome::success(&step.label, detail),
            Err(cause) => {
                log::warn!("step {} failed: {}", step.label, cause);
                StepOutcome::failure(&step.label, cause)
            }
        }
    }
}

/// Deterministic executor for tests: steps succeed unless their label is
/// registered to fail
#[derive(Debug, Default)]
pub struct ScriptedStepExecutor {
    failing_labels: HashSet<String>,
}

impl ScriptedStepExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label whose steps will report failure
    pub fn fail_label(mut self, label: impl Into<String>) -> Self {
        self.failing_labels.insert(label.into());
        self
    }
}

impl StepExecutor for ScriptedStepExecutor {
    fn execute(&self, step: &RemediationStep) -> StepOutcome {
        if self.failing_labels.contains(&step.label) {
            StepOutcome::failure(&step.label, "scripted failure")
        } else {
            StepOutcome::success(&step.label, "scripted success")
        }
    }
}
