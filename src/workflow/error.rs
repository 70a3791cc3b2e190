use thiserror::Error;

use crate::git::GitError;

/// Failures of a commit, amend or integration run.
///
/// Any of these aborts the remaining steps of the invocation.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A rights-guarded operation was attempted off trunk
    #[error("Expected current branch to be {expected}, but was {actual}.")]
    Precondition { expected: String, actual: String },

    /// An underlying git call failed
    #[error(transparent)]
    Vcs(#[from] GitError),

    /// Merging trunk into the destination did not complete cleanly
    #[error("merging {source_branch} into {branch} failed: {source}")]
    Conflict {
        branch: String,
        source_branch: String,
        source: GitError,
    },

    /// The destination was created but still cannot be checked out
    #[error(
        "branch {branch} is unreachable after it was created{}",
        .source.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
    )]
    InvariantViolation {
        branch: String,
        source: Option<GitError>,
    },

    /// A pre-integration check exited unsuccessfully
    #[error("check `{command}` failed: {reason}")]
    CheckFailed { command: String, reason: String },
}

impl WorkflowError {
    pub fn precondition(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        WorkflowError::Precondition {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Short category name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Precondition { .. } => "precondition",
            WorkflowError::Vcs(_) => "vcs",
            WorkflowError::Conflict { .. } => "conflict",
            WorkflowError::InvariantViolation { .. } => "invariant_violation",
            WorkflowError::CheckFailed { .. } => "check_failed",
        }
    }

    /// Follow-up advice printed under the error message
    pub fn hint(&self) -> Option<String> {
        match self {
            WorkflowError::Precondition { expected, .. } => Some(format!(
                "Check out {expected} first, or include \"initial\" in the message of a first commit."
            )),
            WorkflowError::Conflict { branch, .. } => Some(format!(
                "The repository was left on {branch}. Resolve the conflicts, commit, and push manually."
            )),
            WorkflowError::InvariantViolation { .. } => Some(
                "The branch was modified outside trunkflow during the run. Inspect `git branch` before retrying."
                    .to_string(),
            ),
            WorkflowError::CheckFailed { .. } => {
                Some("Fix the failing check or re-run with --skip-checks.".to_string())
            }
            WorkflowError::Vcs(_) => None,
        }
    }
}
