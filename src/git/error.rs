use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the git adapter.
///
/// Every primitive either succeeds or fails with one of these; the tool's own
/// stderr is carried verbatim so callers can show it to the user.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git is not installed or not in PATH")]
    NotInstalled,

    #[error("working directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to execute git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("could not parse git version: {0}")]
    UnparsableVersion(String),
}

impl GitError {
    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        GitError::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// The git subcommand that failed, when the failure came from git itself
    pub fn command(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { command, .. } => Some(command),
            _ => None,
        }
    }
}
