//! conveyor - a pipeline orchestration core
//!
//! Builds an execution plan from a declarative workflow document
//! (dependency graph + matrix fan-out + gating conditions) and drives it
//! to completion, isolating failures per job instance.

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{
    Condition, InstanceId, JobInstance, JobState, JobStatus, JobTemplate, PlanError, PlanStatus,
    ResultStore, RunContext, StepOutcome, StepSpec, StepStatus, Workflow,
};
pub use crate::execution::{
    ActionOutput, ExecutionEngine, ProcessRunner, RunEvent, RunReport, RunnerError, StepRunner,
};
