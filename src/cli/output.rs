//! CLI output formatting

use crate::core::{JobStatus, PlanStatus, StepStatus};
use crate::execution::{RunEvent, RunReport};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the plan's job instances
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a job status for display
pub fn format_job_status(status: JobStatus) -> String {
    match status {
        JobStatus::Pending => style("PENDING").dim().to_string(),
        JobStatus::Running => style("RUNNING").yellow().to_string(),
        JobStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        JobStatus::Failed => style("FAILED").red().to_string(),
        JobStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Format the overall plan status for display
pub fn format_plan_status(status: PlanStatus) -> String {
    match status {
        PlanStatus::Succeeded => style("SUCCEEDED").green().bold().to_string(),
        PlanStatus::Failed => style("FAILED").red().bold().to_string(),
        PlanStatus::Skipped => style("SKIPPED").dim().bold().to_string(),
    }
}

/// Format a run event as a console line; returns None for events that
/// are too chatty for the default output
pub fn format_event(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::RunStarted { workflow, .. } => Some(format!(
            "{} Starting workflow {}",
            ROCKET,
            style(workflow).bold()
        )),
        RunEvent::JobStarted { id } => Some(format!("{} {}", SPINNER, id)),
        RunEvent::JobSkipped { id, reason } => Some(format!(
            "{} {} {}",
            SKIP,
            id,
            style(format!("({})", reason)).dim()
        )),
        RunEvent::JobFinished { id, status } => {
            let icon = match status {
                JobStatus::Succeeded => CHECK,
                JobStatus::Failed => CROSS,
                _ => INFO,
            };
            Some(format!("{} {}", icon, id))
        }
        RunEvent::StepFinished { .. } | RunEvent::RunFinished { .. } => None,
    }
}

/// Format the final per-instance report
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    for row in &report.instances {
        let icon = match row.status {
            JobStatus::Succeeded => CHECK,
            JobStatus::Failed => CROSS,
            JobStatus::Skipped => SKIP,
            _ => INFO,
        };
        out.push_str(&format!(
            "  {} {} - {}",
            icon,
            style(row.id.to_string()).bold(),
            format_job_status(row.status)
        ));
        if let Some(reason) = &row.reason {
            out.push_str(&style(format!(" ({})", reason)).dim().to_string());
        }
        out.push('\n');

        for outcome in &row.outcomes {
            if outcome.status == StepStatus::Failed {
                out.push_str(&format!(
                    "      {} {}\n",
                    style(&outcome.step).red(),
                    style(log_tail(&outcome.logs)).dim()
                ));
            }
        }
    }
    out.push_str(&format!(
        "\n{} Plan: {}\n",
        INFO,
        format_plan_status(report.status)
    ));
    out
}

/// Last non-empty log line, truncated to the terminal width
fn log_tail(logs: &str) -> String {
    let line = logs.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    let width = term_size::dimensions().map(|(w, _)| w).unwrap_or(80);
    let budget = width.saturating_sub(10).max(20);
    if line.chars().count() > budget {
        let truncated: String = line.chars().take(budget - 3).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
