//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Overall status of a plan run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    /// At least one instance succeeded and none failed
    Succeeded,
    /// At least one instance failed
    Failed,
    /// Every instance was skipped
    Skipped,
}

/// Externally visible status of a job instance
///
/// This is what the result store reports and what gating conditions
/// evaluate against. The transient `Ready` scheduler state is reported
/// as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Skipped
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Scheduler-internal state of a single job instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobState {
    /// Waiting for upstream instances to reach a terminal state
    Pending,
    /// All upstreams terminal, condition evaluated true, awaiting a worker
    Ready,
    /// Steps are being dispatched
    Running { started_at: DateTime<Utc> },
    /// All steps done, none failed hard (includes vacuous success)
    Succeeded {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// A non-continuable step failed
    Failed {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// Condition false, empty matrix, or fail-fast cancellation
    Skipped { reason: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded { .. } | JobState::Failed { .. } | JobState::Skipped { .. }
        )
    }

    /// Collapse to the externally visible status
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending | JobState::Ready => JobStatus::Pending,
            JobState::Running { .. } => JobStatus::Running,
            JobState::Succeeded { .. } => JobStatus::Succeeded,
            JobState::Failed { .. } => JobStatus::Failed,
            JobState::Skipped { .. } => JobStatus::Skipped,
        }
    }
}

/// Result of one step within a job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Recorded outcome of a dispatched (or skipped) step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step name as declared
    pub step: String,

    pub status: StepStatus,

    /// Tail of captured output, or the skip/failure reason
    pub logs: String,

    /// Values the step exported for downstream consumption
    pub exports: HashMap<String, String>,
}

impl StepOutcome {
    pub fn skipped(step: &str, reason: &str) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Skipped,
            logs: reason.to_string(),
            exports: HashMap::new(),
        }
    }
}
