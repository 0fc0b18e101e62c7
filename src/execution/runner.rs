//! Step runner - the boundary to external step executors
//!
//! The core dispatches each step's opaque action through [`StepRunner`]
//! exactly once per declared occurrence and never retries on its own.
//! Checkout, compilers, artifact upload and credentialed publishes all
//! live behind this trait.

use crate::core::{Coordinate, RunContext};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::process::Command;

/// Error types for step runner operations
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn action: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// What a runner reports back for one executed action
#[derive(Debug, Clone)]
pub struct ActionOutput {
    /// Whether the action succeeded
    pub success: bool,

    /// Process exit code, when the runner has one
    pub exit_code: Option<i32>,

    /// Captured output
    pub logs: String,

    /// Values the action exported for downstream steps
    pub exports: HashMap<String, String>,
}

/// Trait for executing a single step action.
///
/// The coordinate identifies which matrix instance is asking, so a
/// runner can vary behavior per axis value (e.g. pick a toolchain).
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn execute(
        &self,
        action: &str,
        coordinate: &Coordinate,
        ctx: &RunContext,
    ) -> Result<ActionOutput, RunnerError>;
}

/// Runs actions as shell commands on the local host.
///
/// Run metadata is exposed through `CONVEYOR_*` environment variables
/// and matrix values as `CONVEYOR_MATRIX_<AXIS>`; the secrets handle is
/// passed as an opaque id, never resolved values. Lines printed as
/// `::set-output::key=value` become exports.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: String,
}

impl ProcessRunner {
    pub fn new(shell: &str) -> Self {
        Self {
            shell: shell.to_string(),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl StepRunner for ProcessRunner {
    async fn execute(
        &self,
        action: &str,
        coordinate: &Coordinate,
        ctx: &RunContext,
    ) -> Result<ActionOutput, RunnerError> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(action)
            .env("CONVEYOR_REF", &ctx.git_ref)
            .env("CONVEYOR_COMMIT", &ctx.commit)
            .env("CONVEYOR_EVENT", &ctx.event)
            .env("CONVEYOR_RUN_ID", ctx.run_id.to_string());
        if let Some(handle) = &ctx.secrets_handle {
            command.env("CONVEYOR_SECRETS_HANDLE", handle);
        }
        for (axis, value) in &coordinate.0 {
            command.env(
                format!("CONVEYOR_MATRIX_{}", axis.to_uppercase()),
                value,
            );
        }

        let output = command.output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exports = parse_exports(&stdout);

        let mut logs = stdout.into_owned();
        if !stderr.is_empty() {
            logs.push_str(&stderr);
        }

        Ok(ActionOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            logs,
            exports,
        })
    }
}

const EXPORT_PREFIX: &str = "::set-output::";

fn parse_exports(stdout: &str) -> HashMap<String, String> {
    let mut exports = HashMap::new();
    for line in stdout.lines() {
        if let Some(rest) = line.trim().strip_prefix(EXPORT_PREFIX) {
            if let Some((key, value)) = rest.split_once('=') {
                exports.insert(key.to_string(), value.to_string());
            }
        }
    }
    exports
}
