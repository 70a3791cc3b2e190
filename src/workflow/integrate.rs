use std::path::Path;

use tracing::{debug, info, instrument};

use super::error::WorkflowError;
use super::merge::MergeOrchestrator;
use super::policy::IntegrationPolicy;
use super::sync::BranchSynchronizer;
use super::Workflow;
use crate::checks::{self, GateResult};

/// Outcome of an integration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationReport {
    /// Branch trunk was merged into
    pub destination: String,
    /// The destination had to be created from the starting branch
    pub created_destination: bool,
    /// Branch pushed after the merge
    pub published: String,
    /// Branch checked out at the end of the run
    pub final_branch: String,
    /// Pre-integration checks that ran before any branch was touched
    pub checks: Vec<GateResult>,
}

/// Pre-integration gate settings for `Workflow::integrate_checked`
#[derive(Debug, Clone, Copy)]
pub struct GateOptions<'a> {
    pub commands: &'a [String],
    pub cwd: &'a Path,
    pub skip: bool,
}

impl Workflow {
    /// Merge trunk into the destination chosen by the policy, publish it,
    /// and finish on trunk.
    #[instrument(skip(self, message), fields(has_message = message.is_some()))]
    pub async fn integrate(&self, message: Option<&str>) -> Result<IntegrationReport, WorkflowError> {
        let destination =
            IntegrationPolicy::new(&self.settings.trunk, &self.settings.integration)
                .destination(message);
        info!(destination, "Integrating {}", self.settings.trunk);

        let sync = BranchSynchronizer::new(self.vcs())
            .ensure_on(destination)
            .await?;

        let publisher = self.publisher();
        let merged = MergeOrchestrator::new(self.vcs(), &publisher, &self.settings.trunk)
            .merge_trunk()
            .await?;

        Ok(IntegrationReport {
            destination: destination.to_string(),
            created_destination: sync.created,
            published: merged.published,
            final_branch: merged.final_branch,
            checks: Vec::new(),
        })
    }

    /// Run the pre-integration gate, then integrate.
    ///
    /// A failing check aborts before any git command is issued. With
    /// `gate.skip` set the checks are not run at all.
    #[instrument(skip_all, fields(skip_checks = gate.skip))]
    pub async fn integrate_checked(
        &self,
        message: Option<&str>,
        gate: GateOptions<'_>,
    ) -> Result<IntegrationReport, WorkflowError> {
        let results = if gate.skip {
            debug!("Pre-integration checks skipped");
            Vec::new()
        } else {
            checks::run_gate(gate.commands, gate.cwd).await?
        };

        let mut report = self.integrate(message).await?;
        report.checks = results;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::git::MockGitClient;
    use crate::workflow::WorkflowSettings;

    fn workflow(vcs: &Arc<MockGitClient>) -> Workflow {
        Workflow::new(vcs.clone(), WorkflowSettings::default())
    }

    #[tokio::test]
    async fn test_feature_branch_without_message_creates_integration_branch() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));

        let report = workflow(&vcs).integrate(None).await.unwrap();

        assert_eq!(report.destination, "integrate");
        assert!(report.created_destination);
        assert_eq!(report.published, "integrate");
        assert_eq!(report.final_branch, "master");
        assert_eq!(vcs.current(), "master");

        let merge = vcs
            .commits()
            .into_iter()
            .find(|c| c.merged_from.is_some())
            .unwrap();
        assert_eq!(merge.branch, "integrate");
        assert_eq!(merge.merged_from.as_deref(), Some("master"));
        assert_eq!(vcs.pushes()[0].branch, "integrate");
        assert_eq!(vcs.count("create_branch"), 1);
    }

    #[tokio::test]
    async fn test_existing_integration_branch_is_reused() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        vcs.add_branch("integrate");

        let report = workflow(&vcs).integrate(None).await.unwrap();

        assert!(!report.created_destination);
        assert_eq!(vcs.count("create_branch"), 0);
        assert_eq!(vcs.current(), "master");
    }

    #[tokio::test]
    async fn test_message_targets_trunk_and_ends_on_trunk() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));

        let report = workflow(&vcs)
            .integrate(Some("Release 1.2"))
            .await
            .unwrap();

        assert_eq!(report.destination, "master");
        assert!(!report.created_destination);
        assert_eq!(report.published, "master");
        assert_eq!(vcs.current(), "master");
        assert!(!vcs.branches().contains(&"integrate".to_string()));
    }

    #[tokio::test]
    async fn test_conflict_leaves_repository_on_destination() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        vcs.add_branch("integrate");
        vcs.fail_merge("Automatic merge failed; fix conflicts and then commit the result.");

        let err = workflow(&vcs).integrate(None).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Conflict { .. }));
        assert_eq!(vcs.current(), "integrate");
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_destination_is_not_retried_forever() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        vcs.make_unreachable("integrate");

        let err = workflow(&vcs).integrate(None).await.unwrap_err();

        assert!(matches!(err, WorkflowError::InvariantViolation { .. }));
        assert_eq!(vcs.count("create_branch"), 1);
        assert_eq!(vcs.count("merge"), 0);
        assert_eq!(vcs.count("push"), 0);
    }

    fn gate<'a>(commands: &'a [String], cwd: &'a Path, skip: bool) -> GateOptions<'a> {
        GateOptions {
            commands,
            cwd,
            skip,
        }
    }

    #[tokio::test]
    async fn test_failing_check_stops_before_any_git_call() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        let dir = tempfile::tempdir().unwrap();
        let commands = vec!["trunkflow-no-such-linter --check".to_string()];

        let err = workflow(&vcs)
            .integrate_checked(None, gate(&commands, dir.path(), false))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::CheckFailed { .. }));
        assert!(vcs.get_commands().is_empty());
        assert_eq!(vcs.current(), "feature-x");
    }

    #[tokio::test]
    async fn test_skip_checks_bypasses_failing_gate() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        let dir = tempfile::tempdir().unwrap();
        let commands = vec!["trunkflow-no-such-linter --check".to_string()];

        let report = workflow(&vcs)
            .integrate_checked(None, gate(&commands, dir.path(), true))
            .await
            .unwrap();

        assert!(report.checks.is_empty());
        assert_eq!(report.destination, "integrate");
        assert_eq!(vcs.current(), "master");
        assert_eq!(vcs.count("push"), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_passing_checks_are_reported() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        let dir = tempfile::tempdir().unwrap();
        let commands = vec!["true".to_string()];

        let report = workflow(&vcs)
            .integrate_checked(Some("Release 1.3"), gate(&commands, dir.path(), false))
            .await
            .unwrap();

        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].command, "true");
        assert_eq!(report.destination, "master");
    }

    #[tokio::test]
    async fn test_custom_branch_names() {
        let vcs = Arc::new(MockGitClient::on_branch("feature-x"));
        vcs.add_branch("main");
        let settings = WorkflowSettings {
            trunk: "main".to_string(),
            integration: "staging".to_string(),
            ..WorkflowSettings::default()
        };

        let report = Workflow::new(vcs.clone(), settings)
            .integrate(None)
            .await
            .unwrap();

        assert_eq!(report.destination, "staging");
        assert_eq!(report.final_branch, "main");
        assert_eq!(vcs.current(), "main");
        assert_eq!(vcs.pushes()[0].remote, "origin");
    }
}
