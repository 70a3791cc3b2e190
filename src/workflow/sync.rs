use tracing::{info, instrument, warn};

use super::error::WorkflowError;
use crate::git::VcsClient;

/// How many times a missing destination may be created before giving up
const MAX_CREATE_RETRIES: usize = 1;

/// What the synchronizer had to do to reach the destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The working tree was switched away from its starting branch
    pub switched: bool,
    /// The destination did not exist and was created from the current HEAD
    pub created: bool,
}

/// Makes sure the destination branch exists and is checked out
pub struct BranchSynchronizer<'a> {
    vcs: &'a dyn VcsClient,
}

impl<'a> BranchSynchronizer<'a> {
    pub fn new(vcs: &'a dyn VcsClient) -> Self {
        Self { vcs }
    }

    /// Check out `destination`, creating it at most once if the switch fails.
    ///
    /// The current branch is re-queried at the top of every pass. After a
    /// create-and-switch the next pass must find the destination checked
    /// out; anything else is an `InvariantViolation`.
    #[instrument(skip(self))]
    pub async fn ensure_on(&self, destination: &str) -> Result<SyncOutcome, WorkflowError> {
        let mut outcome = SyncOutcome::default();
        let mut last_error = None;

        for attempt in 0..=MAX_CREATE_RETRIES {
            let current = self.vcs.current_branch().await?;
            if current == destination {
                return Ok(outcome);
            }

            match self.vcs.checkout(destination).await {
                Ok(()) => {
                    outcome.switched = true;
                }
                Err(e) if attempt < MAX_CREATE_RETRIES => {
                    warn!(branch = destination, error = %e, "Switch failed, creating branch");
                    info!("Creating the {} branch", destination);
                    self.vcs.create_branch(destination).await?;
                    outcome.created = true;

                    self.vcs.checkout(destination).await.map_err(|e| {
                        WorkflowError::InvariantViolation {
                            branch: destination.to_string(),
                            source: Some(e),
                        }
                    })?;
                    outcome.switched = true;
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        Err(WorkflowError::InvariantViolation {
            branch: destination.to_string(),
            source: last_error,
        })
    }
}
