// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git plumbing the refinery and doctor rely on.
//!
//! Everything shells out to `git` in a given repository directory;
//! worktree creation itself belongs to the administrative tooling.

use crate::subprocess::{run_with_timeout, GIT_TIMEOUT};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
}

/// Outcome of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    /// The merge hit conflicts and was aborted; the worktree is clean.
    Conflict(String),
    Failed(String),
}

/// Git adapter bound to one repository directory.
#[derive(Clone)]
pub struct GitAdapter {
    repo: PathBuf,
}

impl GitAdapter {
    pub fn in_repo(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    async fn git(&self, args: &[&str]) -> Result<std::process::Output, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.repo);
        run_with_timeout(cmd, GIT_TIMEOUT, "git")
            .await
            .map_err(GitError::CommandFailed)
    }

    async fn git_ok(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.git(args).await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub async fn current_branch(&self) -> Result<String, GitError> {
        Ok(self
            .git_ok(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await?
            .trim()
            .to_string())
    }

    /// Whether a branch exists locally or as a remote-tracking ref.
    pub async fn branch_exists(&self, branch: &str) -> Result<bool, GitError> {
        let local = format!("refs/heads/{}", branch);
        let remote = format!("refs/remotes/origin/{}", branch);
        for refname in [local, remote] {
            let output = self
                .git(&["show-ref", "--verify", "--quiet", &refname])
                .await?;
            if output.status.success() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.git_ok(&["checkout", branch]).await.map(|_| ())
    }

    /// Check out `branch`, creating it from the current HEAD when it
    /// does not exist yet (fresh integration branches).
    pub async fn checkout_or_create(&self, branch: &str) -> Result<(), GitError> {
        if self.branch_exists(branch).await? {
            return self.checkout(branch).await;
        }
        self.git_ok(&["checkout", "-b", branch]).await.map(|_| ())
    }

    pub async fn pull(&self) -> Result<(), GitError> {
        self.git_ok(&["pull", "--ff-only"]).await.map(|_| ())
    }

    /// Whether the worktree has uncommitted changes.
    pub async fn has_uncommitted(&self) -> Result<bool, GitError> {
        let stdout = self.git_ok(&["status", "--porcelain"]).await?;
        Ok(!stdout.trim().is_empty())
    }

    /// Merge `branch` into the currently checked-out target.
    ///
    /// Conflicts abort the merge so the worktree stays clean for the
    /// next attempt.
    pub async fn merge(&self, branch: &str, message: &str) -> Result<MergeOutcome, GitError> {
        let output = self
            .git(&["merge", "--no-ff", "-m", message, branch])
            .await?;
        if output.status.success() {
            return Ok(MergeOutcome::Merged);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.contains("CONFLICT") || stderr.contains("CONFLICT") {
            let _ = self.git(&["merge", "--abort"]).await;
            return Ok(MergeOutcome::Conflict(
                stdout.lines().chain(stderr.lines()).collect::<Vec<_>>().join("\n"),
            ));
        }
        Ok(MergeOutcome::Failed(stderr.trim().to_string()))
    }

    /// Prune merged-or-remote-gone branches matching `pattern`.
    ///
    /// Runs `fetch --prune` first so remote-gone state is current, then
    /// deletes only branches `branch -d` considers safe.
    pub async fn prune_branches(&self, pattern: &str) -> Result<Vec<String>, GitError> {
        self.git_ok(&["fetch", "--prune"]).await?;
        let stdout = self
            .git_ok(&["branch", "--list", pattern, "--format=%(refname:short)"])
            .await?;
        let mut pruned = Vec::new();
        for branch in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let output = self.git(&["branch", "-d", branch]).await?;
            if output.status.success() {
                pruned.push(branch.to_string());
            }
        }
        Ok(pruned)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
