use tracing::{info, instrument};

use super::error::WorkflowError;
use super::guard::is_initial_commit;
use super::Workflow;
use crate::git::CommitOptions;

/// Outcome of a commit or amend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Branch that was committed to and pushed
    pub branch: String,
    pub amended: bool,
    /// The message carried the initial-commit exemption
    pub guard_bypassed: bool,
}

impl Workflow {
    /// Stage everything, commit with `message`, and publish.
    ///
    /// Off trunk this is refused unless the message marks an initial commit.
    #[instrument(skip(self))]
    pub async fn commit(&self, message: &str) -> Result<CommitReport, WorkflowError> {
        let guard_bypassed = is_initial_commit(message);
        if !guard_bypassed {
            self.guard().ensure_commit_rights().await?;
        }

        self.vcs().stage_all(&self.settings.stage_path).await?;
        self.vcs()
            .commit(Some(message), &CommitOptions::default())
            .await?;

        let branch = self.publisher().publish().await?;
        info!(branch = %branch, "Files committed successfully");

        Ok(CommitReport {
            branch,
            amended: false,
            guard_bypassed,
        })
    }

    /// Stage everything into the last commit, keeping its message, and publish.
    ///
    /// Always requires trunk.
    #[instrument(skip(self))]
    pub async fn amend(&self) -> Result<CommitReport, WorkflowError> {
        self.guard().ensure_commit_rights().await?;

        self.vcs().stage_all(&self.settings.stage_path).await?;
        self.vcs().commit(None, &CommitOptions::amend()).await?;

        let branch = self.publisher().publish().await?;
        info!(branch = %branch, "Commit amended successfully");

        Ok(CommitReport {
            branch,
            amended: true,
            guard_bypassed: false,
        })
    }
}
