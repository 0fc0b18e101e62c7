//! Test utility functions for conveyor scenarios

use async_trait::async_trait;
use conveyor::core::config::WorkflowConfig;
use conveyor::core::{Coordinate, JobStatus, RunContext};
use conveyor::execution::{ActionOutput, ExecutionEngine, RunReport, RunnerError, StepRunner};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted runner: actions succeed unless listed as failing, with an
/// optional per-action delay. Records every invocation in order.
pub struct MockRunner {
    failures: Vec<String>,
    delays: HashMap<String, Duration>,
    invoked: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
            delays: HashMap::new(),
            invoked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(actions: &[&str]) -> Self {
        let mut runner = Self::new();
        runner.failures = actions.iter().map(|a| a.to_string()).collect();
        runner
    }

    pub fn with_delay(mut self, action: &str, delay: Duration) -> Self {
        self.delays.insert(action.to_string(), delay);
        self
    }

    /// Handle onto the invocation log; clone before handing the runner
    /// to the engine
    pub fn invocations(&self) -> Arc<Mutex<Vec<String>>> {
        self.invoked.clone()
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn execute(
        &self,
        action: &str,
        coordinate: &Coordinate,
        _ctx: &RunContext,
    ) -> Result<ActionOutput, RunnerError> {
        if let Some(delay) = self.delays.get(action) {
            tokio::time::sleep(*delay).await;
        }

        let label = if coordinate.is_empty() {
            action.to_string()
        } else {
            format!("{} [{}]", action, coordinate)
        };
        self.invoked.lock().unwrap().push(label.clone());

        // failures match the bare action or a coordinate-qualified label
        let success = !self.failures.iter().any(|f| f == action || *f == label);
        Ok(ActionOutput {
            success,
            exit_code: Some(if success { 0 } else { 1 }),
            logs: String::new(),
            exports: HashMap::new(),
        })
    }
}

/// Run context for a plain branch push
pub fn push_ctx(git_ref: &str) -> RunContext {
    RunContext::new(git_ref, "abc1234", "push", None)
}

/// Build the plan from YAML and drive it to completion with the mock
pub async fn run_workflow(yaml: &str, runner: MockRunner, ctx: RunContext) -> RunReport {
    let workflow = WorkflowConfig::from_yaml(yaml)
        .expect("workflow should parse")
        .to_workflow()
        .expect("plan should build");
    ExecutionEngine::new(runner).execute(&workflow, &ctx).await
}

/// Assert that every instance of a job has the given status
pub fn assert_job_status(report: &RunReport, job: &str, status: JobStatus) {
    let statuses: Vec<JobStatus> = report
        .instances
        .iter()
        .filter(|r| r.id.job == job)
        .map(|r| r.status)
        .collect();
    assert!(
        !statuses.is_empty(),
        "no instances of job '{}' in report",
        job
    );
    assert!(
        statuses.iter().all(|s| *s == status),
        "job '{}': expected all {:?}, got {:?}",
        job,
        status,
        statuses
    );
}

/// Assert that one action ran before another
pub fn assert_ran_before(invocations: &[String], first: &str, second: &str) {
    let pos = |needle: &str| {
        invocations
            .iter()
            .position(|a| a.starts_with(needle))
            .unwrap_or_else(|| panic!("action '{}' was never invoked: {:?}", needle, invocations))
    };
    assert!(
        pos(first) < pos(second),
        "expected '{}' before '{}': {:?}",
        first,
        second,
        invocations
    );
}
