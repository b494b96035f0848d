use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use git2::{IndexAddOption, Repository, build::CheckoutBuilder};

/// Handle to a repository owned by the collaborator. Only the workdir path
/// crosses the blocking-task boundary; git2 objects never do.
#[derive(Debug, Clone)]
pub struct RepoHandle {
    pub workdir: PathBuf,
}

/// Capability set the workspace inspector needs from a version-control tool.
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn detect_repository(&self, root: &Path) -> Result<Option<RepoHandle>>;
    async fn current_branch(&self, repo: &RepoHandle) -> Result<String>;
    async fn init_repository(&self, root: &Path) -> Result<RepoHandle>;
    async fn stage_all(&self, repo: &RepoHandle) -> Result<()>;
    async fn commit(&self, repo: &RepoHandle, message: &str) -> Result<()>;
    async fn checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()>;
    async fn create_and_checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()>;
}

/// git2-backed implementation working against the local checkout.
pub struct LocalGit;

#[async_trait]
impl Vcs for LocalGit {
    async fn detect_repository(&self, root: &Path) -> Result<Option<RepoHandle>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || match Repository::discover(&root) {
            Ok(repo) => {
                let workdir = repo.workdir().unwrap_or(repo.path()).to_path_buf();
                Ok(Some(RepoHandle { workdir }))
            }
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        })
        .await
        .map_err(|e| anyhow!("detect_repository task join error: {}", e))?
    }

    async fn current_branch(&self, repo: &RepoHandle) -> Result<String> {
        let workdir = repo.workdir.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&workdir)?;
            let head = repo.find_reference("HEAD")?;
            // An unborn branch only exists as the symbolic target of HEAD.
            let name = match head.symbolic_target() {
                Some(target) => target.strip_prefix("refs/heads/").unwrap_or(target).to_string(),
                None => repo
                    .head()?
                    .shorthand()
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow!("HEAD is not a named branch"))?,
            };
            Ok::<_, anyhow::Error>(name)
        })
        .await
        .map_err(|e| anyhow!("current_branch task join error: {}", e))?
    }

    async fn init_repository(&self, root: &Path) -> Result<RepoHandle> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::init(&root)?;
            tracing::info!("git: initialized repository at {}", root.display());
            let workdir = repo.workdir().unwrap_or(repo.path()).to_path_buf();
            Ok::<_, anyhow::Error>(RepoHandle { workdir })
        })
        .await
        .map_err(|e| anyhow!("init_repository task join error: {}", e))?
    }

    async fn stage_all(&self, repo: &RepoHandle) -> Result<()> {
        let workdir = repo.workdir.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&workdir)?;
            let mut idx = repo.index()?;
            idx.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
            idx.write()?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|e| anyhow!("stage_all task join error: {}", e))?
    }

    async fn commit(&self, repo: &RepoHandle, message: &str) -> Result<()> {
        let workdir = repo.workdir.clone();
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&workdir)?;
            let mut idx = repo.index()?;
            let oid = idx.write_tree()?;
            let tree = repo.find_tree(oid)?;
            let sig = repo
                .signature()
                .or_else(|_| git2::Signature::now("swaship", "swaship@users.noreply.github.com"))?;
            let parent = match repo.head() {
                Ok(head) => {
                    let target = head
                        .target()
                        .ok_or_else(|| anyhow!("HEAD does not point at a commit"))?;
                    Some(repo.find_commit(target)?)
                }
                Err(err)
                    if err.code() == git2::ErrorCode::UnbornBranch
                        || err.code() == git2::ErrorCode::NotFound =>
                {
                    None
                }
                Err(err) => return Err(err.into()),
            };
            let parents: Vec<&git2::Commit> = parent.iter().collect();
            repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|e| anyhow!("commit task join error: {}", e))?
    }

    async fn checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()> {
        let workdir = repo.workdir.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&workdir)?;
            let refname = format!("refs/heads/{}", name);
            let obj = repo.revparse_single(&refname)?;
            repo.checkout_tree(&obj, Some(CheckoutBuilder::new().safe()))?;
            repo.set_head(&refname)?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|e| anyhow!("checkout_branch task join error: {}", e))?
    }

    async fn create_and_checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()> {
        let workdir = repo.workdir.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&workdir)?;
            let head = repo.head()?;
            let target = head
                .target()
                .ok_or_else(|| anyhow!("HEAD does not point at a commit"))?;
            let commit = repo.find_commit(target)?;
            repo.branch(&name, &commit, false)?;
            repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
            repo.set_head(&format!("refs/heads/{}", name))?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|e| anyhow!("create_and_checkout_branch task join error: {}", e))?
    }
}
