use tracing::{error, info, instrument};

use super::error::WorkflowError;
use super::publish::Publisher;
use crate::git::{MergeOptions, VcsClient};

/// Result of a successful trunk merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Branch that received the merge and was pushed
    pub published: String,
    /// Branch checked out once the run finished
    pub final_branch: String,
}

/// Merges trunk into the checked-out branch, publishes it, then returns to trunk
pub struct MergeOrchestrator<'a> {
    vcs: &'a dyn VcsClient,
    publisher: &'a Publisher<'a>,
    trunk: &'a str,
}

impl<'a> MergeOrchestrator<'a> {
    pub fn new(vcs: &'a dyn VcsClient, publisher: &'a Publisher<'a>, trunk: &'a str) -> Self {
        Self {
            vcs,
            publisher,
            trunk,
        }
    }

    /// Merge trunk with `--no-ff --log`.
    ///
    /// On a failed merge nothing is published and the working tree stays on
    /// the destination, mid-merge, for manual resolution.
    #[instrument(skip(self), fields(trunk = self.trunk))]
    pub async fn merge_trunk(&self) -> Result<MergeOutcome, WorkflowError> {
        let branch = self.vcs.current_branch().await?;

        if let Err(source) = self
            .vcs
            .merge(self.trunk, &MergeOptions::integration())
            .await
        {
            error!(branch = %branch, error = %source, "Merge failed");
            return Err(WorkflowError::Conflict {
                branch,
                source_branch: self.trunk.to_string(),
                source,
            });
        }

        let published = self.publisher.publish().await?;
        self.vcs.checkout(self.trunk).await?;
        info!("{} integrated successfully", self.trunk);

        Ok(MergeOutcome {
            published,
            final_branch: self.trunk.to_string(),
        })
    }
}
