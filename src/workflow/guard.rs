use tracing::{debug, instrument};

use super::error::WorkflowError;
use crate::git::VcsClient;

/// Token that exempts a commit message from the trunk-only rule
const INITIAL_COMMIT_TOKEN: &str = "initial";

/// Whether a commit message marks the first commit of a repository
pub fn is_initial_commit(message: &str) -> bool {
    message.to_lowercase().contains(INITIAL_COMMIT_TOKEN)
}

/// Restricts history-mutating operations to the trunk branch
pub struct RightsGuard<'a> {
    vcs: &'a dyn VcsClient,
    trunk: &'a str,
}

impl<'a> RightsGuard<'a> {
    pub fn new(vcs: &'a dyn VcsClient, trunk: &'a str) -> Self {
        Self { vcs, trunk }
    }

    /// Fail unless the working tree is on trunk
    #[instrument(skip(self), fields(trunk = self.trunk))]
    pub async fn ensure_commit_rights(&self) -> Result<(), WorkflowError> {
        let current = self.vcs.current_branch().await?;
        if current != self.trunk {
            return Err(WorkflowError::precondition(self.trunk, current));
        }
        debug!("Commit rights confirmed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockGitClient;

    #[test]
    fn test_initial_token_is_case_insensitive() {
        assert!(is_initial_commit("initial import"));
        assert!(is_initial_commit("Initial commit"));
        assert!(is_initial_commit("INITIAL"));
        assert!(is_initial_commit("reinitialize cache"));
        assert!(!is_initial_commit("Add parser"));
        assert!(!is_initial_commit(""));
    }

    #[tokio::test]
    async fn test_guard_passes_on_trunk() {
        let vcs = MockGitClient::new();
        RightsGuard::new(&vcs, "master")
            .ensure_commit_rights()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_rejects_other_branch() {
        let vcs = MockGitClient::on_branch("feature-x");
        let err = RightsGuard::new(&vcs, "master")
            .ensure_commit_rights()
            .await
            .unwrap_err();

        match err {
            WorkflowError::Precondition { expected, actual } => {
                assert_eq!(expected, "master");
                assert_eq!(actual, "feature-x");
            }
            other => panic!("Expected Precondition, got {other:?}"),
        }
    }
}
