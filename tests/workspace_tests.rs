use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use git2::{IndexAddOption, Repository, Signature};
use tempfile::TempDir;

use swaship::git::LocalGit;
use swaship::prompt::{PromptError, UserInput};
use swaship::workspace::{self, ReconcileError, WorkspaceState};

/// Simulates dismissing a prompt when queued as a response.
const CANCEL: &str = "<cancel>";

/// Queue-driven stand-in for the interactive collaborator. Each prompt pops
/// the front entry; an empty queue fails the test, which catches prompts that
/// should never fire.
struct ScriptedInput {
    responses: Mutex<VecDeque<&'static str>>,
}

impl ScriptedInput {
    fn with(responses: &[&'static str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().copied().collect()),
        }
    }

    fn next(&self, prompt: &str) -> Result<&'static str, PromptError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(CANCEL) => Err(PromptError::Cancelled),
            Some(response) => Ok(response),
            None => panic!("unexpected prompt: {prompt}"),
        }
    }
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn pick(&self, message: &str, actions: &[String]) -> Result<usize, PromptError> {
        let response = self.next(message)?;
        match actions.iter().position(|a| a == response) {
            Some(idx) => Ok(idx),
            None => panic!("response {response:?} not offered in {actions:?}"),
        }
    }

    async fn line(&self, message: &str, _default: Option<&str>) -> Result<String, PromptError> {
        Ok(self.next(message)?.to_string())
    }
}

fn candidates() -> Vec<String> {
    vec![String::from("main"), String::from("master")]
}

fn init_repo_on(root: &Path, branch: &str) -> Result<Repository> {
    let repo = Repository::init(root)?;
    repo.set_head(&format!("refs/heads/{branch}"))?;
    let mut idx = repo.index()?;
    idx.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    idx.write()?;
    let oid = idx.write_tree()?;
    let sig = Signature::now("swaship", "swaship@example.com")?;
    let tree = repo.find_tree(oid)?;
    repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])?;
    drop(tree);
    Ok(repo)
}

async fn inspect(root: &Path) -> Result<WorkspaceState> {
    workspace::inspect(&LocalGit, root, &candidates()).await
}

#[tokio::test]
async fn empty_workspace_without_repo_fails_before_any_mutation() -> Result<()> {
    let td = TempDir::new()?;
    let state = inspect(td.path()).await?;
    assert!(state.repo.is_none());
    assert!(state.is_empty);
    assert_eq!(state.current_branch, None);

    let input = ScriptedInput::with(&[]);
    let err = workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::EmptyWorkspace));
    assert_eq!(
        err.to_string(),
        "Cannot create a Static Web App with an empty workspace."
    );
    assert!(!td.path().join(".git").exists());
    Ok(())
}

#[tokio::test]
async fn create_flow_initializes_stages_and_commits() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;

    let state = inspect(td.path()).await?;
    assert!(state.repo.is_none());
    assert!(!state.is_empty);

    let input = ScriptedInput::with(&["Create", "Test commit"]);
    workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit").await?;

    let state = inspect(td.path()).await?;
    assert!(state.repo.is_some());

    let repo = Repository::open(td.path())?;
    let head = repo.head()?.peel_to_commit()?;
    assert_eq!(head.message(), Some("Test commit"));
    assert_eq!(head.parent_count(), 0);
    Ok(())
}

#[tokio::test]
async fn dismissing_the_create_prompt_cancels_without_mutation() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;

    let state = inspect(td.path()).await?;
    let input = ScriptedInput::with(&[CANCEL]);
    let err = workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Cancelled));
    assert!(!td.path().join(".git").exists());
    Ok(())
}

#[tokio::test]
async fn default_branch_never_prompts() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;
    init_repo_on(td.path(), "main")?;

    let state = inspect(td.path()).await?;
    assert_eq!(state.current_branch.as_deref(), Some("main"));
    assert!(state.on_default_branch());

    // An empty script turns any prompt into a test failure.
    let input = ScriptedInput::with(&[]);
    workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit").await?;
    Ok(())
}

#[tokio::test]
async fn confirming_checkout_lands_on_main() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;
    init_repo_on(td.path(), "work")?;

    let state = inspect(td.path()).await?;
    assert_eq!(state.current_branch.as_deref(), Some("work"));
    assert!(!state.on_default_branch());

    let input = ScriptedInput::with(&["Checkout \"main\""]);
    workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit").await?;

    let state = inspect(td.path()).await?;
    assert_eq!(state.current_branch.as_deref(), Some("main"));
    Ok(())
}

#[tokio::test]
async fn declining_checkout_keeps_the_current_branch() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;
    init_repo_on(td.path(), "work")?;

    let state = inspect(td.path()).await?;
    let input = ScriptedInput::with(&["Continue on \"work\""]);
    workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit").await?;

    let state = inspect(td.path()).await?;
    assert_eq!(state.current_branch.as_deref(), Some("work"));
    Ok(())
}

#[tokio::test]
async fn dismissing_the_branch_prompt_cancels() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;
    init_repo_on(td.path(), "work")?;

    let state = inspect(td.path()).await?;
    let input = ScriptedInput::with(&[CANCEL]);
    let err = workspace::reconcile_for_publish(&LocalGit, &input, &state, "initial commit")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Cancelled));

    let state = inspect(td.path()).await?;
    assert_eq!(state.current_branch.as_deref(), Some("work"));
    Ok(())
}

#[tokio::test]
async fn git_metadata_does_not_count_toward_emptiness() -> Result<()> {
    let td = TempDir::new()?;
    fs::write(td.path().join("index.html"), "<html></html>")?;
    init_repo_on(td.path(), "main")?;
    fs::remove_file(td.path().join("index.html"))?;

    let state = inspect(td.path()).await?;
    assert!(state.repo.is_some());
    assert!(state.is_empty, "a lone .git directory still counts as empty");
    Ok(())
}
