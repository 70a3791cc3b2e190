//! Git CLI wrapper for branch, commit, merge and push operations.
//!
//! Uses the git CLI directly (rather than libgit2) so hooks, credential
//! helpers and the user's git configuration apply to every operation.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::error::GitError;
use super::version::GitVersion;

/// Options for `git commit`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Rewrite the last commit instead of creating a new one
    pub amend: bool,
}

impl CommitOptions {
    pub fn amend() -> Self {
        Self { amend: true }
    }
}

/// Options for `git merge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Always create a merge commit, even when a fast-forward is possible
    pub no_ff: bool,
    /// Include one-line descriptions of the merged commits in the message
    pub log: bool,
}

impl MergeOptions {
    /// Non-fast-forward merge with a recorded log entry
    pub fn integration() -> Self {
        Self {
            no_ff: true,
            log: true,
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::integration()
    }
}

/// Low-level git command wrapper
pub struct GitCli;

impl GitCli {
    /// Execute a git command and return stdout
    async fn run_git(args: &[&str], cwd: &Path) -> Result<String, GitError> {
        debug!(?args, ?cwd, "Running git command");

        // A missing cwd also spawns with NotFound; keep that apart from a missing binary
        if !cwd.is_dir() {
            return Err(GitError::MissingDirectory(cwd.to_path_buf()));
        }

        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => GitError::NotInstalled,
                _ => GitError::Spawn(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // merge and commit report conflicts and "nothing to commit" on stdout
            let message = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(GitError::command_failed(
                *args.first().unwrap_or(&""),
                message,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Execute a git command, returning Ok(()) on success
    async fn run_git_silent(args: &[&str], cwd: &Path) -> Result<(), GitError> {
        Self::run_git(args, cwd).await?;
        Ok(())
    }

    /// Get the current branch name
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn current_branch(path: &Path) -> Result<String, GitError> {
        Self::run_git(&["rev-parse", "--abbrev-ref", "HEAD"], path).await
    }

    /// Switch the working tree to an existing branch
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub async fn checkout(path: &Path, branch: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["checkout", branch], path).await
    }

    /// Create a new branch at the current HEAD without switching to it
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub async fn create_branch(path: &Path, branch: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["branch", branch], path).await
    }

    /// Stage every change (including deletions) under a pathspec
    #[instrument(skip_all, fields(path = %path.display(), pathspec))]
    pub async fn stage_all(path: &Path, pathspec: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["add", "--all", "--", pathspec], path).await
    }

    /// Commit staged changes
    #[instrument(skip_all, fields(path = %path.display(), amend = options.amend))]
    pub async fn commit(
        path: &Path,
        message: Option<&str>,
        options: &CommitOptions,
    ) -> Result<(), GitError> {
        let args = commit_args(message, options)?;
        Self::run_git_silent(&args, path).await
    }

    /// Merge a branch into the current branch
    #[instrument(skip_all, fields(path = %path.display(), source))]
    pub async fn merge(path: &Path, source: &str, options: &MergeOptions) -> Result<(), GitError> {
        let args = merge_args(source, options);
        Self::run_git_silent(&args, path).await
    }

    /// Push a branch to remote
    #[instrument(skip_all, fields(path = %path.display(), remote, branch))]
    pub async fn push(path: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        Self::run_git_silent(&["push", remote, branch], path).await
    }

    /// Get the URL configured for a remote
    #[instrument(skip_all, fields(path = %path.display(), remote))]
    pub async fn remote_url(path: &Path, remote: &str) -> Result<String, GitError> {
        Self::run_git(&["remote", "get-url", remote], path).await
    }

    /// Check if path is inside a git work tree
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn is_worktree(path: &Path) -> Result<bool, GitError> {
        match Self::run_git(&["rev-parse", "--is-inside-work-tree"], path).await {
            Ok(output) => Ok(output == "true"),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Report the installed git version
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn version(path: &Path) -> Result<GitVersion, GitError> {
        let output = Self::run_git(&["--version"], path).await?;
        GitVersion::parse(&output).ok_or(GitError::UnparsableVersion(output))
    }
}

/// Build the argument list for `git commit`
fn commit_args<'a>(
    message: Option<&'a str>,
    options: &CommitOptions,
) -> Result<Vec<&'a str>, GitError> {
    let mut args = vec!["commit"];
    if options.amend {
        args.push("--amend");
    }
    match message {
        Some(message) => {
            args.push("-m");
            args.push(message);
        }
        None if options.amend => args.push("--no-edit"),
        None => {
            return Err(GitError::command_failed(
                "commit",
                "a commit message is required unless amending",
            ))
        }
    }
    Ok(args)
}

/// Build the argument list for `git merge`
fn merge_args<'a>(source: &'a str, options: &MergeOptions) -> Vec<&'a str> {
    let mut args = vec!["merge", "--no-edit"];
    if options.no_ff {
        args.push("--no-ff");
    }
    if options.log {
        args.push("--log");
    }
    args.push(source);
    args
}
