//! Test: conditional publish gating on refs - the modeled CI pipeline
//!
//! Style check, lint, compile, a multi-toolchain test matrix, coverage,
//! docs publish gated on the master branch, crate publish gated on tag
//! refs.

use crate::helpers::*;
use conveyor::core::{JobStatus, PlanStatus};

const CI_PIPELINE: &str = r#"
name: "rust-library-ci"
jobs:
  - name: "style"
    steps:
      - name: "rustfmt"
        action: "fmt-check"
  - name: "lint"
    steps:
      - name: "clippy"
        action: "clippy"
  - name: "compile"
    steps:
      - name: "build"
        action: "build"
  - name: "test"
    needs: ["compile"]
    matrix:
      toolchain: ["1.74", "stable", "beta"]
    steps:
      - name: "run"
        action: "run-tests"
  - name: "coverage"
    needs: ["test"]
    steps:
      - name: "tarpaulin"
        action: "coverage"
  - name: "publish-docs"
    needs: ["test"]
    condition: "success() && ref == 'refs/heads/master'"
    continue_on_error: true
    steps:
      - name: "build-docs"
        action: "doc-build"
      - name: "upload"
        action: "doc-upload"
  - name: "publish-crate"
    needs: ["test"]
    condition: "success() && starts_with(ref, 'refs/tags/')"
    continue_on_error: true
    steps:
      - name: "upload"
        action: "cargo-publish"
"#;

#[tokio::test]
async fn test_tag_ref_publishes_crate_not_docs() {
    let runner = MockRunner::new();
    let invocations = runner.invocations();
    let report = run_workflow(CI_PIPELINE, runner, push_ctx("refs/tags/v1.0.0")).await;

    assert_eq!(report.status, PlanStatus::Succeeded);
    assert_job_status(&report, "publish-crate", JobStatus::Succeeded);
    assert_job_status(&report, "publish-docs", JobStatus::Skipped);

    let invoked = invocations.lock().unwrap();
    assert!(invoked.iter().any(|a| a.starts_with("cargo-publish")));
    assert!(!invoked.iter().any(|a| a.starts_with("doc-upload")));
}

#[tokio::test]
async fn test_master_ref_publishes_docs_not_crate() {
    let runner = MockRunner::new();
    let report = run_workflow(CI_PIPELINE, runner, push_ctx("refs/heads/master")).await;

    assert_eq!(report.status, PlanStatus::Succeeded);
    assert_job_status(&report, "publish-docs", JobStatus::Succeeded);
    assert_job_status(&report, "publish-crate", JobStatus::Skipped);
}

#[tokio::test]
async fn test_feature_branch_publishes_nothing() {
    let runner = MockRunner::new();
    let report = run_workflow(CI_PIPELINE, runner, push_ctx("refs/heads/feature/x")).await;

    assert_eq!(report.status, PlanStatus::Succeeded);
    assert_job_status(&report, "publish-docs", JobStatus::Skipped);
    assert_job_status(&report, "publish-crate", JobStatus::Skipped);
    assert_job_status(&report, "coverage", JobStatus::Succeeded);
}

#[tokio::test]
async fn test_dependents_never_start_before_upstreams_terminate() {
    let runner = MockRunner::new();
    let invocations = runner.invocations();
    let report = run_workflow(CI_PIPELINE, runner, push_ctx("refs/heads/master")).await;
    assert_eq!(report.status, PlanStatus::Succeeded);

    let invoked = invocations.lock().unwrap();
    assert_ran_before(&invoked, "build", "run-tests");
    assert_ran_before(&invoked, "run-tests", "coverage");
    assert_ran_before(&invoked, "run-tests", "doc-build");
    // every matrix element precedes anything that needs the template
    let last_test = invoked
        .iter()
        .rposition(|a| a.starts_with("run-tests"))
        .unwrap();
    let first_cov = invoked
        .iter()
        .position(|a| a.starts_with("coverage"))
        .unwrap();
    assert!(last_test < first_cov);
}

#[tokio::test]
async fn test_failed_matrix_element_blocks_both_publishes() {
    let runner = MockRunner::failing(&["run-tests [toolchain=beta]"]);
    let report = run_workflow(CI_PIPELINE, runner, push_ctx("refs/tags/v1.0.0")).await;

    assert_eq!(report.status, PlanStatus::Failed);
    assert_job_status(&report, "publish-docs", JobStatus::Skipped);
    assert_job_status(&report, "publish-crate", JobStatus::Skipped);
    assert_job_status(&report, "coverage", JobStatus::Skipped);
    // unrelated branches of the graph are untouched by the failure
    assert_job_status(&report, "style", JobStatus::Succeeded);
    assert_job_status(&report, "lint", JobStatus::Succeeded);
}
