use anyhow::{Context, Result};
use conveyor::cli::commands::{PlanCommand, RunCommand, ValidateCommand};
use conveyor::cli::output::*;
use conveyor::cli::{Cli, Command};
use conveyor::core::config::WorkflowConfig;
use conveyor::core::{PlanStatus, RunContext};
use conveyor::execution::{ExecutionEngine, ProcessRunner, RunEvent};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
        Command::Plan(cmd) => show_plan(cmd)?,
    }

    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow")?;
    let mut workflow = config.to_workflow().context("Failed to build plan")?;

    if cmd.fail_fast {
        workflow.fail_fast = true;
    }
    if cmd.workers.is_some() {
        workflow.workers = cmd.workers;
    }

    println!(
        "{} Loaded workflow: {} ({} job instances)",
        INFO,
        style(&workflow.name).bold(),
        style(workflow.instances.len()).cyan()
    );

    let ctx = RunContext::new(
        &cmd.git_ref,
        &cmd.commit,
        &cmd.event,
        cmd.secrets_handle.clone(),
    );
    let engine = ExecutionEngine::new(ProcessRunner::default());

    let progress = create_progress_bar(workflow.instances.len());
    let bar = progress.clone();
    engine
        .add_event_handler(move |event| {
            if let Some(line) = format_event(&event) {
                bar.println(line);
            }
            if matches!(
                event,
                RunEvent::JobFinished { .. } | RunEvent::JobSkipped { .. }
            ) {
                bar.inc(1);
            }
        })
        .await;

    let report = engine.execute(&workflow, &ctx).await;
    progress.finish_and_clear();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print!("{}", format_report(&report));
    }

    if report.status == PlanStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file)
        .and_then(|config| config.to_workflow().map_err(Into::into));
    let workflow = match result {
        Ok(workflow) => workflow,
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    };

    println!("{} Workflow is valid!", CHECK);
    println!("  Name: {}", style(&workflow.name).bold());
    println!("  Jobs: {}", style(workflow.templates.len()).cyan());
    println!(
        "  Instances: {}",
        style(workflow.instances.len()).cyan()
    );

    if cmd.json {
        let data = serde_json::json!({
            "name": workflow.name,
            "jobs": workflow.templates.len(),
            "instances": workflow.instances.len(),
        });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow")?;
    let workflow = config.to_workflow().context("Failed to build plan")?;

    if cmd.json {
        let data = serde_json::json!({
            "name": workflow.name,
            "order": workflow.graph.topo_order(),
            "instances": workflow
                .instances
                .iter()
                .map(|i| i.id.to_string())
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!(
        "{} Plan for {}",
        INFO,
        style(&workflow.name).bold()
    );
    println!("\n  Dispatch order:");
    for (i, name) in workflow.graph.topo_order().iter().enumerate() {
        println!("    {}. {}", i + 1, style(name).bold());
    }
    println!("\n  Instances:");
    for instance in &workflow.instances {
        println!("    {}", instance.id);
    }
    Ok(())
}
