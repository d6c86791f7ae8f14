//! Optimization orchestration: steps, strategies, and the run state machine

pub mod orchestrator;
pub mod privilege;
pub mod step;
pub mod strategy;
pub mod types;

pub use orchestrator::{Orchestrator, RunHandle};
pub use privilege::{detect_platform, detect_privilege, Platform, PrivilegeLevel};
pub use step::{
    RemediationStep, ScriptedStepExecutor, ShellStepExecutor, StepAction, StepExecutor,
    DEFAULT_MAX_STALE_FILES,
};
pub use strategy::{select_strategy, RemediationStrategy};
pub use types::{OptimizationKind, OptimizationRun, OptimizerError, StepOutcome};
