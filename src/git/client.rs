//! Version-control client abstraction.
//!
//! Provides a trait over the seven primitives the workflow needs so that:
//! - The real implementation shells out to git in one repository
//! - Unit tests run against an in-memory mock with failure injection

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::cli::{CommitOptions, GitCli, MergeOptions};
use super::error::GitError;

/// Primitive version-control operations against a single working tree.
///
/// Implementations are pass-throughs: no retries, no caching of the current
/// branch. Callers await each call before issuing the next.
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Name of the branch currently checked out
    async fn current_branch(&self) -> Result<String, GitError>;

    /// Switch to an existing branch
    async fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Create a branch at the current HEAD
    async fn create_branch(&self, branch: &str) -> Result<(), GitError>;

    /// Stage all changes under a pathspec
    async fn stage_all(&self, pathspec: &str) -> Result<(), GitError>;

    /// Commit staged changes, or amend the last commit
    async fn commit(&self, message: Option<&str>, options: &CommitOptions)
        -> Result<(), GitError>;

    /// Merge `source` into the current branch
    async fn merge(&self, source: &str, options: &MergeOptions) -> Result<(), GitError>;

    /// Push a branch to a remote
    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Real implementation using the system git binary
pub struct SystemGitClient {
    repo_path: PathBuf,
}

impl SystemGitClient {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

#[async_trait]
impl VcsClient for SystemGitClient {
    async fn current_branch(&self) -> Result<String, GitError> {
        GitCli::current_branch(&self.repo_path).await
    }

    async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        GitCli::checkout(&self.repo_path, branch).await
    }

    async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        GitCli::create_branch(&self.repo_path, branch).await
    }

    async fn stage_all(&self, pathspec: &str) -> Result<(), GitError> {
        GitCli::stage_all(&self.repo_path, pathspec).await
    }

    async fn commit(
        &self,
        message: Option<&str>,
        options: &CommitOptions,
    ) -> Result<(), GitError> {
        GitCli::commit(&self.repo_path, message, options).await
    }

    async fn merge(&self, source: &str, options: &MergeOptions) -> Result<(), GitError> {
        GitCli::merge(&self.repo_path, source, options).await
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        GitCli::push(&self.repo_path, remote, branch).await
    }
}

/// Mock implementation for testing
#[derive(Default)]
pub struct MockGitClient {
    repo: Arc<Mutex<MockRepo>>,
    /// Record of commands executed
    pub command_log: Arc<Mutex<Vec<MockCommand>>>,
}

#[derive(Debug, Default)]
struct MockRepo {
    current: String,
    branches: BTreeSet<String>,
    commits: Vec<MockCommit>,
    pushes: Vec<MockPush>,
    staged: Vec<String>,
    /// Branches whose checkout always fails, even after creation
    unreachable: HashSet<String>,
    merge_failure: Option<String>,
    push_failure: Option<String>,
    commit_failure: Option<String>,
}

/// A commit recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub branch: String,
    pub message: Option<String>,
    pub amend: bool,
    /// Set for merge commits
    pub merged_from: Option<String>,
}

/// A push recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPush {
    pub remote: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct MockCommand {
    pub operation: String,
    pub args: Vec<String>,
}

impl MockGitClient {
    /// Create a mock repository with only `master`, checked out
    pub fn new() -> Self {
        Self::on_branch("master")
    }

    /// Create a mock with `master` plus `branch`, with `branch` checked out
    pub fn on_branch(branch: &str) -> Self {
        let mock = Self::default();
        {
            let mut repo = mock.repo.lock().unwrap();
            repo.branches.insert("master".to_string());
            repo.branches.insert(branch.to_string());
            repo.current = branch.to_string();
        }
        mock
    }

    /// Add a pre-existing branch
    pub fn add_branch(&self, branch: &str) {
        self.repo.lock().unwrap().branches.insert(branch.to_string());
    }

    /// Make every checkout of `branch` fail, simulating out-of-band tampering
    pub fn make_unreachable(&self, branch: &str) {
        self.repo
            .lock()
            .unwrap()
            .unreachable
            .insert(branch.to_string());
    }

    /// Make the next merges fail with the given tool output
    pub fn fail_merge(&self, message: &str) {
        self.repo.lock().unwrap().merge_failure = Some(message.to_string());
    }

    /// Make pushes fail with the given tool output
    pub fn fail_push(&self, message: &str) {
        self.repo.lock().unwrap().push_failure = Some(message.to_string());
    }

    /// Make commits fail with the given tool output
    pub fn fail_commit(&self, message: &str) {
        self.repo.lock().unwrap().commit_failure = Some(message.to_string());
    }

    pub fn current(&self) -> String {
        self.repo.lock().unwrap().current.clone()
    }

    pub fn branches(&self) -> Vec<String> {
        self.repo.lock().unwrap().branches.iter().cloned().collect()
    }

    pub fn commits(&self) -> Vec<MockCommit> {
        self.repo.lock().unwrap().commits.clone()
    }

    pub fn pushes(&self) -> Vec<MockPush> {
        self.repo.lock().unwrap().pushes.clone()
    }

    pub fn staged(&self) -> Vec<String> {
        self.repo.lock().unwrap().staged.clone()
    }

    /// Get the command log
    pub fn get_commands(&self) -> Vec<MockCommand> {
        self.command_log.lock().unwrap().clone()
    }

    /// Operation names in call order
    pub fn operations(&self) -> Vec<String> {
        self.get_commands()
            .into_iter()
            .map(|c| c.operation)
            .collect()
    }

    /// Number of times an operation was invoked
    pub fn count(&self, operation: &str) -> usize {
        self.get_commands()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_command(&self, operation: &str, args: &[&str]) {
        self.command_log.lock().unwrap().push(MockCommand {
            operation: operation.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
    }
}

#[async_trait]
impl VcsClient for MockGitClient {
    async fn current_branch(&self) -> Result<String, GitError> {
        self.log_command("current_branch", &[]);
        Ok(self.current())
    }

    async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.log_command("checkout", &[branch]);

        let mut repo = self.repo.lock().unwrap();
        if !repo.branches.contains(branch) || repo.unreachable.contains(branch) {
            return Err(GitError::command_failed(
                "checkout",
                format!("error: pathspec '{branch}' did not match any file(s) known to git"),
            ));
        }
        repo.current = branch.to_string();
        Ok(())
    }

    async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        self.log_command("create_branch", &[branch]);

        let mut repo = self.repo.lock().unwrap();
        if !repo.branches.insert(branch.to_string()) {
            return Err(GitError::command_failed(
                "branch",
                format!("fatal: a branch named '{branch}' already exists"),
            ));
        }
        Ok(())
    }

    async fn stage_all(&self, pathspec: &str) -> Result<(), GitError> {
        self.log_command("stage_all", &[pathspec]);
        self.repo.lock().unwrap().staged.push(pathspec.to_string());
        Ok(())
    }

    async fn commit(
        &self,
        message: Option<&str>,
        options: &CommitOptions,
    ) -> Result<(), GitError> {
        self.log_command(
            "commit",
            &[
                message.unwrap_or(""),
                if options.amend { "--amend" } else { "" },
            ],
        );

        let mut repo = self.repo.lock().unwrap();
        if let Some(failure) = repo.commit_failure.clone() {
            return Err(GitError::command_failed("commit", failure));
        }
        let branch = repo.current.clone();
        repo.commits.push(MockCommit {
            branch,
            message: message.map(str::to_string),
            amend: options.amend,
            merged_from: None,
        });
        Ok(())
    }

    async fn merge(&self, source: &str, options: &MergeOptions) -> Result<(), GitError> {
        self.log_command(
            "merge",
            &[
                source,
                if options.no_ff { "--no-ff" } else { "" },
                if options.log { "--log" } else { "" },
            ],
        );

        let mut repo = self.repo.lock().unwrap();
        if let Some(failure) = repo.merge_failure.clone() {
            return Err(GitError::command_failed("merge", failure));
        }
        if !repo.branches.contains(source) {
            return Err(GitError::command_failed(
                "merge",
                format!("merge: {source} - not something we can merge"),
            ));
        }
        let branch = repo.current.clone();
        repo.commits.push(MockCommit {
            message: Some(format!("Merge branch '{source}' into {branch}")),
            branch,
            amend: false,
            merged_from: Some(source.to_string()),
        });
        Ok(())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.log_command("push", &[remote, branch]);

        let mut repo = self.repo.lock().unwrap();
        if let Some(failure) = repo.push_failure.clone() {
            return Err(GitError::command_failed("push", failure));
        }
        repo.pushes.push(MockPush {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }
}
