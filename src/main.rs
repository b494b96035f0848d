use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use swaship::config::load_minimal_config;
use swaship::git::LocalGit;
use swaship::prompt::ConsoleInput;
use swaship::workflow::{self, BuildConfig};
use swaship::workspace::{self, ReconcileError};

#[derive(Parser, Debug)]
#[command(name = "swaship", version, about = "Static Web App publish helper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the source range of a build configuration value in a workflow file
    Locate {
        file: PathBuf,
        #[arg(value_enum)]
        key: BuildConfig,
    },
    /// Replace a build configuration value in a workflow file
    Set {
        file: PathBuf,
        #[arg(value_enum)]
        key: BuildConfig,
        value: String,
    },
    /// Show the publish-readiness state of a workspace
    Check {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Bring a workspace into a publishable state (init, commit, branch)
    Prepare {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Locate { file, key } => run_locate(&file, key).await,
        Commands::Set { file, key, value } => run_set(&file, key, &value).await,
        Commands::Check { path } => run_check(&path).await,
        Commands::Prepare { path } => run_prepare(&path).await,
    }
}

async fn run_locate(file: &Path, key: BuildConfig) -> Result<ExitCode> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    match workflow::locate(&content, key) {
        Some(range) => {
            let value = range.slice(&content).unwrap_or_default();
            println!(
                "{}:{}-{}:{} {}",
                range.start_line, range.start_col, range.end_line, range.end_col, value
            );
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("not found");
            Ok(ExitCode::from(1))
        }
    }
}

async fn run_set(file: &Path, key: BuildConfig, value: &str) -> Result<ExitCode> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let Some(range) = workflow::locate(&content, key) else {
        bail!(
            "no unambiguous occurrence of {} in {}",
            key.canonical_name(),
            file.display()
        );
    };
    let updated = workflow::replace_value(&content, range, value);
    tokio::fs::write(file, updated)
        .await
        .with_context(|| format!("failed to write {}", file.display()))?;
    println!("set {} = {}", key.canonical_name(), value);
    Ok(ExitCode::SUCCESS)
}

async fn run_check(path: &Path) -> Result<ExitCode> {
    let cfg = load_minimal_config(path).await?;
    let vcs = LocalGit;
    let state = workspace::inspect(&vcs, path, &cfg.default_branch_candidates()).await?;
    println!(
        "repository: {}",
        if state.repo.is_some() { "yes" } else { "none" }
    );
    println!("branch: {}", state.current_branch.as_deref().unwrap_or("n/a"));
    println!("empty: {}", if state.is_empty { "yes" } else { "no" });
    let ready = state.repo.is_some() && !state.is_empty && state.on_default_branch();
    println!("ready: {}", if ready { "yes" } else { "no" });
    Ok(ExitCode::SUCCESS)
}

async fn run_prepare(path: &Path) -> Result<ExitCode> {
    let cfg = load_minimal_config(path).await?;
    let vcs = LocalGit;
    let input = ConsoleInput;
    let candidates = cfg.default_branch_candidates();
    let state = workspace::inspect(&vcs, path, &candidates).await?;
    match workspace::reconcile_for_publish(&vcs, &input, &state, cfg.default_commit_message()).await
    {
        Ok(()) => {
            // The state is a snapshot; recompute after mutation.
            let state = workspace::inspect(&vcs, path, &candidates).await?;
            println!(
                "prepare: ready (branch={})",
                state.current_branch.as_deref().unwrap_or("<none>")
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(ReconcileError::Cancelled) => {
            tracing::debug!("prepare: cancelled by user");
            Ok(ExitCode::from(1))
        }
        Err(err @ ReconcileError::EmptyWorkspace) => {
            eprintln!("{err}");
            Ok(ExitCode::from(2))
        }
        Err(ReconcileError::Failure(err)) => Err(err),
    }
}
