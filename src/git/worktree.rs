//! Git worktree manager for isolated session development.
//!
//! Per-session worktrees for parallel development, global locking to
//! prevent race conditions during creation, and cleanup on completion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;
use crate::git::cli::GitCli;

lazy_static::lazy_static! {
    static ref WORKTREE_CREATION_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> =
        Mutex::new(HashMap::new());
}

/// `git branch`/`git worktree add -b` report an existing branch via stderr
/// rather than a distinct exit status, so we pattern-match it to surface
/// the dedicated error variant instead of a generic command failure.
fn branch_creation_error(branch: &str, e: anyhow::Error) -> GitError {
    let msg = e.to_string();
    if msg.contains("already exists") {
        GitError::BranchExists(branch.to_string())
    } else {
        GitError::CommandFailed(msg)
    }
}

async fn get_path_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = WORKTREE_CREATION_LOCKS.lock().await;
    locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Information about a created worktree.
#[derive(Debug, Clone)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: String,
    pub base_commit: String,
    pub repo_path: PathBuf,
    pub target_branch: String,
}

/// Manages git worktrees for session development.
pub struct WorktreeManager {
    /// Base directory all session worktrees are created under.
    base_worktree_dir: PathBuf,
}

impl WorktreeManager {
    pub fn new(base_worktree_dir: PathBuf) -> Self {
        Self { base_worktree_dir }
    }

    pub fn worktree_path(&self, session_id: &str) -> PathBuf {
        self.base_worktree_dir.join(session_id)
    }

    /// Create a worktree for a session. If `branch_name` is `None`, the
    /// worktree is attached to the base branch directly (no new branch) —
    /// used when `create_branches` is disabled.
    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn create_worktree(
        &self,
        repo_path: &Path,
        session_id: &str,
        base_branch: &str,
        branch_name: Option<&str>,
    ) -> Result<WorktreeInfo, GitError> {
        let worktree_path = self.worktree_path(session_id);

        let lock = get_path_lock(&worktree_path).await;
        let _guard = lock.lock().await;

        info!(?worktree_path, %base_branch, ?branch_name, "creating worktree for session");

        if worktree_path.exists() {
            debug!("worktree already exists, validating");
            return self
                .validate_existing_worktree(&worktree_path, repo_path, base_branch)
                .await;
        }

        if let Some(parent) = worktree_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = GitCli::fetch(repo_path, "origin").await {
            warn!("failed to fetch from origin: {e}");
        }

        if !GitCli::remote_branch_exists(repo_path, "origin", base_branch)
            .await
            .unwrap_or(false)
            && GitCli::current_branch(repo_path).await.unwrap_or_default() != base_branch
        {
            return Err(GitError::BaseBranchMissing(base_branch.to_string()));
        }

        let base_ref = if GitCli::remote_branch_exists(repo_path, "origin", base_branch)
            .await
            .unwrap_or(false)
        {
            format!("origin/{base_branch}")
        } else {
            base_branch.to_string()
        };

        let effective_branch = branch_name.unwrap_or(base_branch).to_string();

        if branch_name.is_some() {
            GitCli::add_worktree(repo_path, &worktree_path, &effective_branch, true, Some(&base_ref))
                .await
                .map_err(|e| branch_creation_error(&effective_branch, e))?;
        } else {
            GitCli::add_worktree(repo_path, &worktree_path, &base_ref, false, None)
                .await
                .map_err(|e| GitError::CommandFailed(e.to_string()))?;
        }

        let base_commit = GitCli::head_commit(&worktree_path)
            .await
            .map_err(|e| GitError::CommandFailed(e.to_string()))?;

        info!("worktree created");

        Ok(WorktreeInfo {
            path: worktree_path,
            branch: effective_branch,
            base_commit,
            repo_path: repo_path.to_path_buf(),
            target_branch: base_branch.to_string(),
        })
    }

    async fn validate_existing_worktree(
        &self,
        worktree_path: &Path,
        repo_path: &Path,
        target_branch: &str,
    ) -> Result<WorktreeInfo, GitError> {
        if !GitCli::is_worktree(worktree_path).await.unwrap_or(false) {
            return Err(GitError::CommandFailed(format!(
                "path exists but is not a valid git worktree: {}",
                worktree_path.display()
            )));
        }

        let current_branch = GitCli::current_branch(worktree_path)
            .await
            .map_err(|e| GitError::CommandFailed(e.to_string()))?;
        let base_commit = GitCli::head_commit(worktree_path)
            .await
            .map_err(|e| GitError::CommandFailed(e.to_string()))?;

        Ok(WorktreeInfo {
            path: worktree_path.to_path_buf(),
            branch: current_branch,
            base_commit,
            repo_path: repo_path.to_path_buf(),
            target_branch: target_branch.to_string(),
        })
    }

    /// Remove a session's worktree, trying `git worktree remove`, then
    /// `--force`, then a manual directory removal as a last resort.
    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn remove_worktree(
        &self,
        repo_path: &Path,
        session_id: &str,
        delete_branch: bool,
    ) -> Result<(), GitError> {
        let worktree_path = self.worktree_path(session_id);
        if !worktree_path.exists() {
            return Ok(());
        }

        let lock = get_path_lock(&worktree_path).await;
        let _guard = lock.lock().await;

        let branch = GitCli::current_branch(&worktree_path).await.ok();

        if let Err(e) = GitCli::remove_worktree(repo_path, &worktree_path, false).await {
            warn!("git worktree remove failed, trying force: {e}");
            if let Err(e) = GitCli::remove_worktree(repo_path, &worktree_path, true).await {
                warn!("git worktree remove --force failed: {e}");
                if let Err(e) = fs::remove_dir_all(&worktree_path).await {
                    warn!("failed to remove worktree directory manually: {e}");
                }
            }
        }

        if let Err(e) = GitCli::prune_worktrees(repo_path).await {
            warn!("failed to prune worktrees: {e}");
        }

        if delete_branch {
            if let Some(branch) = branch {
                if let Err(e) = GitCli::delete_branch(repo_path, &branch, true).await {
                    warn!("failed to delete local branch '{branch}': {e}");
                }
            }
        }

        Ok(())
    }

    pub async fn is_dirty(&self, worktree: &WorktreeInfo) -> Result<bool, GitError> {
        GitCli::is_dirty(&worktree.path)
            .await
            .map_err(|e| GitError::CommandFailed(e.to_string()))
    }

    pub async fn push_changes(&self, worktree: &WorktreeInfo, set_upstream: bool) -> Result<(), GitError> {
        GitCli::push(&worktree.path, "origin", &worktree.branch, set_upstream)
            .await
            .map_err(|e| GitError::CommandFailed(e.to_string()))
    }
}
