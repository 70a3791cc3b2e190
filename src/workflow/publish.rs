use tracing::{info, instrument};

use super::error::WorkflowError;
use crate::git::VcsClient;

/// Pushes whatever branch is checked out to the configured remote.
///
/// A failed push is returned to the caller; the local change that preceded
/// it stays in place.
pub struct Publisher<'a> {
    vcs: &'a dyn VcsClient,
    remote: &'a str,
}

impl<'a> Publisher<'a> {
    pub fn new(vcs: &'a dyn VcsClient, remote: &'a str) -> Self {
        Self { vcs, remote }
    }

    /// Push the current branch, returning its name
    #[instrument(skip(self), fields(remote = self.remote))]
    pub async fn publish(&self) -> Result<String, WorkflowError> {
        let branch = self.vcs.current_branch().await?;
        self.vcs.push(self.remote, &branch).await?;
        info!(branch = %branch, "Changes published successfully");
        Ok(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockGitClient, MockPush};

    #[tokio::test]
    async fn test_publish_pushes_current_branch() {
        let vcs = MockGitClient::on_branch("integrate");
        let branch = Publisher::new(&vcs, "upstream").publish().await.unwrap();

        assert_eq!(branch, "integrate");
        assert_eq!(
            vcs.pushes(),
            vec![MockPush {
                remote: "upstream".to_string(),
                branch: "integrate".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_publish_requeries_branch() {
        let vcs = MockGitClient::new();
        vcs.add_branch("integrate");
        let publisher = Publisher::new(&vcs, "origin");

        publisher.publish().await.unwrap();
        vcs.checkout("integrate").await.unwrap();
        publisher.publish().await.unwrap();

        let pushed: Vec<_> = vcs.pushes().into_iter().map(|p| p.branch).collect();
        assert_eq!(pushed, vec!["master", "integrate"]);
    }

    #[tokio::test]
    async fn test_push_failure_propagates() {
        let vcs = MockGitClient::new();
        vcs.fail_push("fatal: Authentication failed");

        let err = Publisher::new(&vcs, "origin").publish().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Vcs(_)));
        assert!(err.to_string().contains("Authentication failed"));
    }
}
