//! Test: step deadlines

use crate::helpers::*;
use conveyor::core::{JobStatus, PlanStatus, StepStatus};
use std::time::Duration;

#[tokio::test]
async fn test_expired_deadline_fails_the_step() {
    let yaml = r#"
name: "ci"
jobs:
  - name: "compile"
    steps:
      - name: "build"
        action: "slow-build"
        timeout_secs: 1
"#;
    let runner =
        MockRunner::new().with_delay("slow-build", Duration::from_secs(5));
    let report = run_workflow(yaml, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Failed);
    assert_job_status(&report, "compile", JobStatus::Failed);

    let compile = report.instance("compile").unwrap();
    assert_eq!(compile.outcomes[0].status, StepStatus::Failed);
    assert!(compile.outcomes[0].logs.contains("Timeout after 1 seconds"));
}

#[tokio::test]
async fn test_deadline_with_headroom_passes() {
    let yaml = r#"
name: "ci"
jobs:
  - name: "compile"
    steps:
      - name: "build"
        action: "quick-build"
        timeout_secs: 5
"#;
    let runner =
        MockRunner::new().with_delay("quick-build", Duration::from_millis(50));
    let report = run_workflow(yaml, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Succeeded);
}

#[tokio::test]
async fn test_timed_out_step_respects_continue_on_error() {
    let yaml = r#"
name: "ci"
jobs:
  - name: "publish"
    steps:
      - name: "upload"
        action: "slow-upload"
        timeout_secs: 1
        continue_on_error: true
"#;
    let runner =
        MockRunner::new().with_delay("slow-upload", Duration::from_secs(5));
    let report = run_workflow(yaml, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Succeeded);
    assert_job_status(&report, "publish", JobStatus::Succeeded);
}
