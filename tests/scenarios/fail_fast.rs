//! Test: fail-fast cancellation policy

use crate::helpers::*;
use conveyor::core::{JobStatus, PlanStatus};
use std::time::Duration;

#[tokio::test]
async fn test_fail_fast_cancels_not_yet_started_jobs() {
    // "slow" holds a branch open long enough for "quick" to fail, so
    // slow's dependent is still pending when cancellation fires
    let yaml = r#"
name: "ci"
fail_fast: true
jobs:
  - name: "quick"
    steps:
      - name: "boom"
        action: "boom"
  - name: "slow"
    steps:
      - name: "sleep"
        action: "slow-action"
  - name: "after-slow"
    needs: ["slow"]
    steps:
      - name: "run"
        action: "after-slow-action"
"#;
    let runner = MockRunner::failing(&["boom"])
        .with_delay("slow-action", Duration::from_millis(200));
    let invocations = runner.invocations();
    let report = run_workflow(yaml, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Failed);
    assert_job_status(&report, "quick", JobStatus::Failed);
    // already running when the failure landed: allowed to finish
    assert_job_status(&report, "slow", JobStatus::Succeeded);
    // never started
    let after = report.instance("after-slow").unwrap();
    assert_eq!(after.status, JobStatus::Skipped);
    assert_eq!(after.reason.as_deref(), Some("cancelled (fail-fast)"));
    assert!(!invocations
        .lock()
        .unwrap()
        .contains(&"after-slow-action".to_string()));
}

#[tokio::test]
async fn test_without_fail_fast_siblings_keep_running() {
    let yaml = r#"
name: "ci"
jobs:
  - name: "quick"
    steps:
      - name: "boom"
        action: "boom"
  - name: "slow"
    steps:
      - name: "sleep"
        action: "slow-action"
  - name: "after-slow"
    needs: ["slow"]
    steps:
      - name: "run"
        action: "after-slow-action"
"#;
    let runner = MockRunner::failing(&["boom"])
        .with_delay("slow-action", Duration::from_millis(100));
    let report = run_workflow(yaml, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Failed);
    assert_job_status(&report, "slow", JobStatus::Succeeded);
    assert_job_status(&report, "after-slow", JobStatus::Succeeded);
}
