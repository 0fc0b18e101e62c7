//! CLI command definitions

use clap::Args;

/// Run a workflow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Triggering ref, e.g. refs/heads/master or refs/tags/v1.0.0
    #[arg(long, default_value = "refs/heads/master")]
    pub git_ref: String,

    /// Commit identifier
    #[arg(long, default_value = "0000000")]
    pub commit: String,

    /// Event kind, e.g. push
    #[arg(long, default_value = "push")]
    pub event: String,

    /// Opaque handle into the external secret store, passed through to
    /// step runners
    #[arg(long)]
    pub secrets_handle: Option<String>,

    /// Cancel not-yet-started jobs after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Worker pool width override
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output the final report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a workflow document
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the execution plan: topological order and expanded instances
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
