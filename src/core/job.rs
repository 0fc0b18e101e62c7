//! Job domain model

use crate::core::condition::Condition;
use crate::core::state::{JobState, StepOutcome};
use serde::Serialize;

/// A named job definition prior to matrix expansion
#[derive(Debug, Clone)]
pub struct JobTemplate {
    /// Unique job name
    pub name: String,

    /// Names of upstream jobs this job depends on
    pub needs: Vec<String>,

    /// Gating condition; `None` means "all upstreams succeeded"
    pub condition: Option<Condition>,

    /// Matrix axes in declaration order; empty when the job has no matrix
    pub matrix: Vec<MatrixAxis>,

    /// Ordered step specs, shared verbatim by every instance
    pub steps: Vec<StepSpec>,
}

impl JobTemplate {
    /// The condition the scheduler evaluates when the job becomes ready
    pub fn gate(&self) -> Condition {
        self.condition
            .clone()
            .unwrap_or_else(Condition::upstream_succeeded)
    }
}

/// One dimension of matrix variation
#[derive(Debug, Clone)]
pub struct MatrixAxis {
    pub name: String,
    /// Values in declaration order
    pub values: Vec<String>,
}

/// A single step within a job
#[derive(Debug, Clone)]
pub struct StepSpec {
    pub name: String,

    /// Opaque action reference handed to the step runner
    pub action: String,

    /// Optional per-step gate
    pub condition: Option<Condition>,

    /// A failing step with this flag does not fail the owning job
    pub continue_on_error: bool,

    /// Deadline in seconds; expiry counts as step failure
    pub timeout_secs: Option<u64>,
}

/// One concrete matrix coordinate: ordered (axis, value) pairs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coordinate(pub Vec<(String, String)>);

impl Coordinate {
    pub fn empty() -> Self {
        Coordinate(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(axis, value)| format!("{}={}", axis, value))
            .collect();
        write!(f, "{}", pairs.join(", "))
    }
}

/// Identity of a job instance: template name plus matrix coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId {
    pub job: String,
    pub coordinate: Coordinate,
}

impl InstanceId {
    pub fn new(job: &str, coordinate: Coordinate) -> Self {
        Self {
            job: job.to_string(),
            coordinate,
        }
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.coordinate.is_empty() {
            write!(f, "{}", self.job)
        } else {
            write!(f, "{} ({})", self.job, self.coordinate)
        }
    }
}

/// A runnable unit: one template bound to one coordinate
///
/// Mutated only by the scheduler for the duration of a run and discarded
/// at run end.
#[derive(Debug, Clone)]
pub struct JobInstance {
    pub id: InstanceId,
    pub state: JobState,
    pub outcomes: Vec<StepOutcome>,
}

impl JobInstance {
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            state: JobState::Pending,
            outcomes: Vec::new(),
        }
    }

    /// A placeholder for a template whose matrix expanded to nothing,
    /// so the report shows the job instead of silently dropping it
    pub fn skipped_empty_matrix(job: &str) -> Self {
        Self {
            id: InstanceId::new(job, Coordinate::empty()),
            state: JobState::Skipped {
                reason: "empty matrix".to_string(),
            },
            outcomes: Vec::new(),
        }
    }
}
