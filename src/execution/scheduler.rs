//! Scheduling decisions - readiness, status rollup, plan status
//!
//! Pure functions over the result store; the engine owns the lock and
//! the dispatch loop.

use crate::core::{InstanceId, JobState, JobStatus, PlanStatus, ResultStore, Workflow};
use std::collections::BTreeMap;

/// Roll a template's instance statuses up into one status for downstream
/// gating: any failed instance fails the template, a template whose
/// instances all skipped is skipped, otherwise it succeeded.
pub fn template_status(store: &ResultStore, job: &str) -> JobStatus {
    let mut all_skipped = true;
    let mut any_failed = false;
    let mut any_open = false;

    for instance in store.template_instances(job) {
        match instance.state.status() {
            JobStatus::Failed => any_failed = true,
            JobStatus::Skipped => {}
            JobStatus::Succeeded => all_skipped = false,
            JobStatus::Pending | JobStatus::Running => {
                all_skipped = false;
                any_open = true;
            }
        }
    }

    if any_failed {
        JobStatus::Failed
    } else if any_open {
        JobStatus::Running
    } else if all_skipped {
        JobStatus::Skipped
    } else {
        JobStatus::Succeeded
    }
}

/// Rolled-up statuses of a job's declared upstreams, keyed by template
/// name. This is what gating conditions evaluate against.
pub fn upstream_statuses(
    store: &ResultStore,
    workflow: &Workflow,
    job: &str,
) -> BTreeMap<String, JobStatus> {
    workflow
        .graph
        .needs_of(job)
        .iter()
        .map(|need| (need.clone(), template_status(store, need)))
        .collect()
}

/// Pending instances whose upstream templates have fully terminated,
/// in dispatch priority order: topological, then expansion order.
pub fn ready_instances(store: &ResultStore, workflow: &Workflow) -> Vec<InstanceId> {
    let mut ready = Vec::new();
    for name in workflow.graph.topo_order() {
        if !upstreams_terminal(store, workflow, name) {
            continue;
        }
        for instance in store.template_instances(name) {
            if matches!(instance.state, JobState::Pending) {
                ready.push(instance.id.clone());
            }
        }
    }
    ready
}

fn upstreams_terminal(store: &ResultStore, workflow: &Workflow, job: &str) -> bool {
    workflow.graph.needs_of(job).iter().all(|need| {
        store
            .template_instances(need)
            .all(|instance| instance.state.is_terminal())
    })
}

/// Terminal plan status: failed if any instance failed, succeeded if at
/// least one instance succeeded, skipped when every instance skipped.
pub fn plan_status(store: &ResultStore) -> PlanStatus {
    let mut any_succeeded = false;
    for instance in store.instances() {
        match instance.state.status() {
            JobStatus::Failed => return PlanStatus::Failed,
            JobStatus::Succeeded => any_succeeded = true,
            _ => {}
        }
    }
    if any_succeeded {
        PlanStatus::Succeeded
    } else {
        PlanStatus::Skipped
    }
}
