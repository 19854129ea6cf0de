//! Waypoint CLI - drive task progression for deployed targets.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use waypoint_core::{
    is_valid_target_name, CheckState, EvaluationOutcome, ReportState, StatusReport, Target,
};
use waypoint_engine::{project, CheckRegistry, Evaluator, TargetSession, TaskLoader, TaskSet};
use waypoint_storage::{JsonStorage, Storage};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Deployment task progression checker", long_about = None)]
struct Cli {
    /// Task source file
    #[arg(long, default_value = "tasks.yml")]
    tasks: PathBuf,

    /// Data directory for persisted status
    #[arg(long, default_value = ".waypoint")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new target
    New {
        /// Target name (becomes the subdomain)
        name: String,
    },
    /// Run checks against a target and record the outcome
    Check {
        /// Target name
        name: String,
    },
    /// Show a target's status from persisted state
    Status {
        /// Target name
        name: String,
    },
    /// List targets by score
    List,
    /// Show a target's changelog
    Log {
        /// Target name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let registry = CheckRegistry::with_builtins();
    let loader = TaskLoader::new(&registry);
    let task_set = loader.load_file(&cli.tasks).await?;

    let mut storage = JsonStorage::new(&cli.data_dir).await?;

    match cli.command {
        Commands::New { name } => {
            if !is_valid_target_name(&name) {
                anyhow::bail!(
                    "invalid target name `{}` (lowercase letters, digits and inner dashes)",
                    name
                );
            }
            let Some(first_task) = task_set.tasks.first() else {
                anyhow::bail!("task source {} declares no tasks", cli.tasks.display());
            };
            let base_url = base_url_for(&task_set, &name)?;

            let target = Target::new(&name, base_url, &first_task.name);
            storage.create_target(&target).await?;
            println!("Target created: {}", target.base_url);
        }
        Commands::Check { name } => {
            let target = find(&storage, &name).await?;
            let session = TargetSession::new(&target.base_url)?;

            let outcome = Evaluator::new()
                .evaluate_sequence(&task_set.tasks, &session)
                .await;
            let target = storage.update_status(&name, &outcome).await?;
            info!("recorded status for {} (score {})", target.name, target.score);

            let persisted = storage.task_statuses(&name).await?;
            print_report(&project(&task_set.tasks, &outcome, &persisted));
        }
        Commands::Status { name } => {
            let target = find(&storage, &name).await?;
            let persisted = storage.task_statuses(&name).await?;
            let outcome = EvaluationOutcome {
                tasks: Vec::new(),
                current_task: Some(target.current_task.clone()),
            };
            println!("{} ({})", target.name, target.base_url);
            print_report(&project(&task_set.tasks, &outcome, &persisted));
        }
        Commands::List => {
            let targets = storage.list_targets().await?;
            println!("Targets ({})", targets.len());
            for target in targets {
                println!(
                    "  {} | score {} | on {}",
                    target.name, target.score, target.current_task
                );
            }
        }
        Commands::Log { name } => {
            find(&storage, &name).await?;
            for entry in storage.changelog(&name).await? {
                println!(
                    "{} [{}] {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    kind_label(entry.kind),
                    entry.message
                );
            }
        }
    }

    Ok(())
}

fn base_url_for(task_set: &TaskSet, name: &str) -> Result<String> {
    task_set
        .base_url_for(name)
        .ok_or_else(|| anyhow::anyhow!("task source has no `base_url` config"))
}

async fn find(storage: &JsonStorage, name: &str) -> Result<Target> {
    storage
        .find_target(name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("target not found: {}", name))
}

fn print_report(report: &StatusReport) {
    println!("Progress: {}%", report.progress);
    for task in &report.tasks {
        println!("  [{}] {} - {}", state_label(task.status), task.name, task.title);
        for check in &task.checks {
            println!("      {} {}", check_label(check.status), check.title);
            if !check.message.is_empty() {
                for line in check.message.lines() {
                    println!("        {}", line);
                }
            }
        }
    }
}

fn state_label(state: ReportState) -> &'static str {
    match state {
        ReportState::Pass => "PASS",
        ReportState::Fail => "FAIL",
        ReportState::Current => "CURRENT",
        ReportState::Locked => "LOCKED",
    }
}

fn check_label(state: CheckState) -> &'static str {
    match state {
        CheckState::Pass => "ok:",
        CheckState::Fail => "fail:",
        CheckState::Error => "error:",
    }
}

fn kind_label(kind: waypoint_core::ChangelogKind) -> &'static str {
    match kind {
        waypoint_core::ChangelogKind::Deploy => "deploy",
        waypoint_core::ChangelogKind::TaskDone => "task-done",
    }
}
