use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::git::{RepoHandle, Vcs};
use crate::prompt::{PromptError, UserInput};

/// Conventional default-branch names, in the order they are reconciled
/// against.
pub const DEFAULT_BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

pub const DEFAULT_COMMIT_MESSAGE: &str = "initial commit";

/// Snapshot of a workspace's publish-readiness. Recomputed per inspection;
/// reconciliation mutates the checkout, never this value.
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    pub root: PathBuf,
    pub repo: Option<RepoHandle>,
    /// Whether the root directory holds no entries. The VCS metadata
    /// directory does not count when a repository is present.
    pub is_empty: bool,
    /// Populated iff `repo` is present.
    pub current_branch: Option<String>,
    pub default_branch_candidates: Vec<String>,
}

impl WorkspaceState {
    pub fn on_default_branch(&self) -> bool {
        match &self.current_branch {
            Some(branch) => self.default_branch_candidates.iter().any(|c| c == branch),
            None => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Publishing needs at least one file to commit. Raised before any
    /// mutation of the workspace.
    #[error("Cannot create a Static Web App with an empty workspace.")]
    EmptyWorkspace,
    /// The user dismissed a prompt; callers abort without reporting a
    /// failure.
    #[error("publish preparation cancelled")]
    Cancelled,
    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

impl From<PromptError> for ReconcileError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled => ReconcileError::Cancelled,
            PromptError::Io(err) => ReconcileError::Failure(err.into()),
        }
    }
}

/// Read-only look at the workspace: repository presence, current branch,
/// emptiness.
pub async fn inspect(
    vcs: &dyn Vcs,
    root: &Path,
    default_branch_candidates: &[String],
) -> Result<WorkspaceState> {
    let repo = vcs.detect_repository(root).await?;

    let mut entries = tokio::fs::read_dir(root)
        .await
        .with_context(|| format!("failed to list {}", root.display()))?;
    let mut count = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if repo.is_some() && entry.file_name() == ".git" {
            continue;
        }
        count += 1;
    }

    let current_branch = match &repo {
        Some(handle) => Some(vcs.current_branch(handle).await?),
        None => None,
    };

    tracing::debug!(
        "inspect: root={} repo={} empty={} branch={:?}",
        root.display(),
        repo.is_some(),
        count == 0,
        current_branch
    );

    Ok(WorkspaceState {
        root: root.to_path_buf(),
        repo,
        is_empty: count == 0,
        current_branch,
        default_branch_candidates: default_branch_candidates.to_vec(),
    })
}

/// Drive the workspace into a publishable state.
///
/// Without a repository: fail outright on an empty workspace, otherwise offer
/// to create one and commit everything. With a repository on a non-default
/// branch: offer to check out the first default-branch candidate, creating it
/// if it does not exist yet; declining keeps the current branch and the
/// publish proceeds on it. Callers must serialize calls per root, the
/// checkout is a single mutable resource.
pub async fn reconcile_for_publish(
    vcs: &dyn Vcs,
    input: &dyn UserInput,
    state: &WorkspaceState,
    default_commit_message: &str,
) -> Result<(), ReconcileError> {
    match &state.repo {
        None => {
            if state.is_empty {
                return Err(ReconcileError::EmptyWorkspace);
            }
            let actions = vec![String::from("Create")];
            input
                .pick(
                    "The workspace is not a git repository. A repository is required to publish a Static Web App.",
                    &actions,
                )
                .await?;
            let message = input
                .line(
                    "Enter a commit message for the initial commit",
                    Some(default_commit_message),
                )
                .await?;
            let repo = vcs.init_repository(&state.root).await?;
            vcs.stage_all(&repo).await?;
            vcs.commit(&repo, &message).await?;
            tracing::info!(
                "reconcile: initialized and committed at {}",
                repo.workdir.display()
            );
        }
        Some(repo) => {
            if state.on_default_branch() {
                return Ok(());
            }
            let current = state.current_branch.as_deref().unwrap_or("HEAD");
            let target = state
                .default_branch_candidates
                .first()
                .cloned()
                .unwrap_or_else(|| String::from("main"));
            let actions = vec![
                format!("Checkout \"{target}\""),
                format!("Continue on \"{current}\""),
            ];
            let choice = input
                .pick(
                    &format!(
                        "Branch \"{current}\" is not a default branch. Static Web Apps are usually built from \"{target}\"."
                    ),
                    &actions,
                )
                .await?;
            if choice == 0 {
                if let Err(err) = vcs.checkout_branch(repo, &target).await {
                    tracing::debug!("reconcile: checkout of {} failed ({err:#}), creating it", target);
                    vcs.create_and_checkout_branch(repo, &target).await?;
                }
                tracing::info!("reconcile: checked out {}", target);
            }
        }
    }
    Ok(())
}
