//! Branch-integration workflow engine.
//!
//! Composes the rights guard, integration policy, branch synchronizer, merge
//! orchestrator and publisher over a `VcsClient`. Every step awaits the one
//! before it and the current branch is always re-queried, never cached.

use std::sync::Arc;

use crate::config::Config;
use crate::git::VcsClient;

mod commit;
mod error;
mod guard;
mod integrate;
mod merge;
mod policy;
mod publish;
mod sync;

pub use commit::CommitReport;
pub use error::WorkflowError;
pub use guard::{is_initial_commit, RightsGuard};
pub use integrate::{GateOptions, IntegrationReport};
pub use merge::{MergeOrchestrator, MergeOutcome};
pub use policy::IntegrationPolicy;
pub use publish::Publisher;
pub use sync::{BranchSynchronizer, SyncOutcome};

/// Branch and remote names a workflow operates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub trunk: String,
    pub integration: String,
    pub remote: String,
    pub stage_path: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            trunk: config.branches.trunk.clone(),
            integration: config.branches.integration.clone(),
            remote: config.remote.name.clone(),
            stage_path: config.repo.stage_path.clone(),
        }
    }
}

/// Entry point for the commit, amend and integrate flows
pub struct Workflow {
    vcs: Arc<dyn VcsClient>,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(vcs: Arc<dyn VcsClient>, settings: WorkflowSettings) -> Self {
        Self { vcs, settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    fn vcs(&self) -> &dyn VcsClient {
        self.vcs.as_ref()
    }

    fn guard(&self) -> RightsGuard<'_> {
        RightsGuard::new(self.vcs(), &self.settings.trunk)
    }

    fn publisher(&self) -> Publisher<'_> {
        Publisher::new(self.vcs(), &self.settings.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.branches.trunk = "main".to_string();
        config.remote.name = "upstream".to_string();

        let settings = WorkflowSettings::from(&config);
        assert_eq!(settings.trunk, "main");
        assert_eq!(settings.integration, "integrate");
        assert_eq!(settings.remote, "upstream");
        assert_eq!(settings.stage_path, ".");
    }
}
