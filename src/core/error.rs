//! Plan-build error taxonomy
//!
//! Every variant is detected before any job executes. A workflow that
//! passes plan build cannot fail for structural reasons at run time.

use thiserror::Error;

/// Errors raised while lowering a workflow document into a plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Duplicate job name: {0}")]
    DuplicateJob(String),

    #[error("Job '{job}' needs unknown job '{needs}'")]
    UnknownDependency { job: String, needs: String },

    #[error("Cycle detected in dependency graph: {}", members.join(" -> "))]
    CycleDetected { members: Vec<String> },

    #[error("Invalid condition '{expr}': {reason}")]
    InvalidCondition { expr: String, reason: String },

    #[error("Invalid matrix for job '{job}': {reason}")]
    InvalidMatrix { job: String, reason: String },
}
