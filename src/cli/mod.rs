//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{PlanCommand, RunCommand, ValidateCommand};

/// Pipeline orchestration core
#[derive(Debug, Parser, Clone)]
#[command(name = "conveyor")]
#[command(author = "Conveyor Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Run declarative job pipelines with DAG scheduling and matrix fan-out", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a workflow
    Run(RunCommand),

    /// Validate a workflow document
    Validate(ValidateCommand),

    /// Show the execution plan without running it
    Plan(PlanCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }
}
