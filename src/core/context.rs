//! Run context and result store - the shared state of one run

use crate::core::job::{InstanceId, JobInstance};
use crate::core::state::{JobState, StepOutcome};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Immutable inputs of a run, fixed at trigger time
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Triggering ref, e.g. "refs/heads/master" or "refs/tags/v1.0.0"
    pub git_ref: String,

    /// Commit identifier
    pub commit: String,

    /// Event kind, e.g. "push"
    pub event: String,

    /// Opaque handle into the external credential store. The core never
    /// sees secret values.
    pub secrets_handle: Option<String>,
}

impl RunContext {
    pub fn new(git_ref: &str, commit: &str, event: &str, secrets_handle: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            git_ref: git_ref.to_string(),
            commit: commit.to_string(),
            event: event.to_string(),
            secrets_handle,
        }
    }
}

/// Mutable per-run state: every job instance and its status.
///
/// The single piece of shared mutable state in a run. The engine wraps it
/// in a lock; no job mutates another job's record.
#[derive(Debug)]
pub struct ResultStore {
    instances: Vec<JobInstance>,
    index: HashMap<InstanceId, usize>,
    /// Set by fail-fast cancellation; ready-but-unstarted instances check
    /// it before transitioning to running
    cancelled: bool,
}

impl ResultStore {
    pub fn new(instances: Vec<JobInstance>) -> Self {
        let index = instances
            .iter()
            .enumerate()
            .map(|(i, instance)| (instance.id.clone(), i))
            .collect();
        Self {
            instances,
            index,
            cancelled: false,
        }
    }

    pub fn instances(&self) -> &[JobInstance] {
        &self.instances
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&JobInstance> {
        self.index.get(id).map(|&i| &self.instances[i])
    }

    pub fn set_state(&mut self, id: &InstanceId, state: JobState) {
        if let Some(&i) = self.index.get(id) {
            self.instances[i].state = state;
        }
    }

    pub fn push_outcome(&mut self, id: &InstanceId, outcome: StepOutcome) {
        if let Some(&i) = self.index.get(id) {
            self.instances[i].outcomes.push(outcome);
        }
    }

    /// Instances belonging to one template
    pub fn template_instances<'a>(&'a self, job: &'a str) -> impl Iterator<Item = &'a JobInstance> {
        self.instances.iter().filter(move |i| i.id.job == job)
    }

    pub fn all_terminal(&self) -> bool {
        self.instances.iter().all(|i| i.state.is_terminal())
    }

    pub fn any_failed(&self) -> bool {
        self.instances
            .iter()
            .any(|i| matches!(i.state, JobState::Failed { .. }))
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Fail-fast cancellation: pending instances are skipped outright;
    /// ready instances observe the flag and skip themselves before
    /// starting. Running instances are left to finish.
    pub fn cancel_not_started(&mut self, reason: &str) {
        self.cancelled = true;
        for instance in &mut self.instances {
            if matches!(instance.state, JobState::Pending) {
                instance.state = JobState::Skipped {
                    reason: reason.to_string(),
                };
            }
        }
    }
}
