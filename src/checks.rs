//! External collaborators around the workflow engine.
//!
//! - The pre-integration gate runs configured lint/test commands in order
//!   before any branch is touched.
//! - The doctor verifies the git toolchain and repository setup.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::git::{GitCli, GitError, GitVersion};
use crate::workflow::WorkflowError;

/// Outcome of one gate command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub command: String,
    pub duration: Duration,
}

/// Split a configured command line into program and arguments
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Run every gate command in order, stopping at the first failure.
///
/// Commands inherit the terminal so tool output stays visible.
#[instrument(skip_all, fields(cwd = %cwd.display(), count = commands.len()))]
pub async fn run_gate(commands: &[String], cwd: &Path) -> Result<Vec<GateResult>, WorkflowError> {
    let mut results = Vec::with_capacity(commands.len());

    for command in commands {
        let Some((program, args)) = split_command(command) else {
            debug!("Skipping blank check command");
            continue;
        };

        info!(command = %command, "Running check");
        let start = Instant::now();

        let status = Command::new(program)
            .args(&args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| WorkflowError::CheckFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            warn!(command = %command, %status, "Check failed");
            return Err(WorkflowError::CheckFailed {
                command: command.clone(),
                reason: status.to_string(),
            });
        }

        results.push(GateResult {
            command: command.clone(),
            duration: start.elapsed(),
        });
    }

    Ok(results)
}

/// One line of the doctor report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Compare an installed version with a "major.minor" requirement
fn version_check(version: &GitVersion, requirement: &str) -> DoctorCheck {
    match GitVersion::parse_requirement(requirement) {
        Some((major, minor)) if version.meets_minimum(major, minor) => DoctorCheck::pass(
            "git version",
            format!("{version} (minimum {major}.{minor})"),
        ),
        Some((major, minor)) => DoctorCheck::fail(
            "git version",
            format!("{version} is older than the minimum required ({major}.{minor})"),
        ),
        None => DoctorCheck::fail(
            "git version",
            format!("invalid checks.min_git_version: {requirement:?}"),
        ),
    }
}

/// Verify git is installed and recent enough, and that the repository and
/// its remote are set up.
#[instrument(skip_all)]
pub async fn doctor(config: &Config) -> Vec<DoctorCheck> {
    let repo_path = config.repo_path();
    let mut checks = Vec::new();

    match which::which("git") {
        Ok(path) => checks.push(DoctorCheck::pass("git binary", path.display().to_string())),
        Err(e) => {
            checks.push(DoctorCheck::fail("git binary", e.to_string()));
            return checks;
        }
    }

    match GitCli::version(&repo_path).await {
        Ok(version) => checks.push(version_check(&version, &config.checks.min_git_version)),
        Err(e) => checks.push(DoctorCheck::fail("git version", e.to_string())),
    }

    match GitCli::is_worktree(&repo_path).await {
        Ok(true) => checks.push(DoctorCheck::pass(
            "repository",
            repo_path.display().to_string(),
        )),
        Ok(false) => {
            checks.push(DoctorCheck::fail(
                "repository",
                format!("{} is not inside a git work tree", repo_path.display()),
            ));
            return checks;
        }
        Err(e) => {
            checks.push(DoctorCheck::fail("repository", e.to_string()));
            return checks;
        }
    }

    match GitCli::remote_url(&repo_path, &config.remote.name).await {
        Ok(url) => checks.push(DoctorCheck::pass(
            "remote",
            format!("{} -> {}", config.remote.name, url),
        )),
        Err(GitError::CommandFailed { .. }) => checks.push(DoctorCheck::fail(
            "remote",
            format!("remote '{}' is not configured", config.remote.name),
        )),
        Err(e) => checks.push(DoctorCheck::fail("remote", e.to_string())),
    }

    checks
}
