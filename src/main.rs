use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use trunkflow::checks;
use trunkflow::config::Config;
use trunkflow::git::SystemGitClient;
use trunkflow::logging;
use trunkflow::workflow::{GateOptions, Workflow, WorkflowError, WorkflowSettings};

/// Print a workflow failure with its follow-up hint
fn print_workflow_error(err: &WorkflowError) {
    eprintln!("Error: {}", err);
    if let Some(hint) = err.hint() {
        eprintln!();
        eprintln!("{}", hint);
    }
}

#[derive(Parser)]
#[command(name = "trunkflow")]
#[command(about = "Commit, amend and integrate branches with an opinionated trunk policy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage all changes, commit on trunk and publish
    Commit {
        /// Commit message (containing "initial" allows committing off trunk)
        message: String,
    },

    /// Stage all changes into the last trunk commit and publish
    Amend,

    /// Merge trunk into the integration branch (or trunk with -m) and publish
    Integrate {
        /// Target trunk instead of the integration branch
        #[arg(short, long)]
        message: Option<String>,

        /// Do not run the configured pre-integration checks
        #[arg(long)]
        skip_checks: bool,
    },

    /// Check the git installation and repository setup
    Doctor,

    /// Print the effective configuration
    Config {
        /// Write it to .trunkflow.toml
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let logging_handle = logging::init_logging(&config, cli.debug)?;

    let result = match cli.command {
        Commands::Commit { message } => cmd_commit(&config, &message).await,
        Commands::Amend => cmd_amend(&config).await,
        Commands::Integrate {
            message,
            skip_checks,
        } => cmd_integrate(&config, message.as_deref(), skip_checks).await,
        Commands::Doctor => {
            if cmd_doctor(&config).await {
                return Ok(());
            }
            drop(logging_handle);
            std::process::exit(1);
        }
        Commands::Config { init } => return cmd_config(&config, init),
    };

    if let Err(err) = result {
        tracing::error!(kind = err.kind(), "{}", err);
        print_workflow_error(&err);
        // Flush file logs before exiting
        drop(logging_handle);
        std::process::exit(1);
    }

    Ok(())
}

fn build_workflow(config: &Config) -> Workflow {
    let client = SystemGitClient::new(config.repo_path());
    Workflow::new(Arc::new(client), WorkflowSettings::from(config))
}

async fn cmd_commit(config: &Config, message: &str) -> Result<(), WorkflowError> {
    let report = build_workflow(config).commit(message).await?;
    tracing::debug!(branch = %report.branch, bypassed = report.guard_bypassed, "Committed");
    println!("Files committed successfully.");
    Ok(())
}

async fn cmd_amend(config: &Config) -> Result<(), WorkflowError> {
    let report = build_workflow(config).amend().await?;
    tracing::debug!(branch = %report.branch, "Amended");
    println!("Commit amended successfully.");
    Ok(())
}

async fn cmd_integrate(
    config: &Config,
    message: Option<&str>,
    skip_checks: bool,
) -> Result<(), WorkflowError> {
    let repo_path = config.repo_path();
    let gate = GateOptions {
        commands: &config.checks.commands,
        cwd: &repo_path,
        skip: skip_checks,
    };

    let report = build_workflow(config)
        .integrate_checked(message, gate)
        .await?;
    for result in &report.checks {
        println!("✓ {} ({:.1?})", result.command, result.duration);
    }
    if report.created_destination {
        println!("Created branch {}.", report.destination);
    }
    tracing::debug!(
        destination = %report.destination,
        final_branch = %report.final_branch,
        "Integration finished"
    );
    println!("{} integrated successfully.", config.branches.trunk);
    Ok(())
}

/// Print the doctor report, returning whether every check passed
async fn cmd_doctor(config: &Config) -> bool {
    let results = checks::doctor(config).await;

    for check in &results {
        let mark = if check.ok { "✓" } else { "✗" };
        println!("{} {:<12} {}", mark, check.name, check.detail);
    }

    results.iter().all(|c| c.ok)
}

fn cmd_config(config: &Config, init: bool) -> Result<()> {
    if init {
        let path = config.init()?;
        println!("Wrote {}", path.display());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
