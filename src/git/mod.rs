//! Git operations module - CLI wrapper and the version-control client seam.
//!
//! `GitCli` issues individual git commands; `VcsClient` is the narrow
//! interface the workflow engine depends on, with a system implementation
//! bound to one repository and an in-memory mock for tests.

mod cli;
mod client;
mod error;
mod version;

pub use cli::{CommitOptions, GitCli, MergeOptions};
pub use client::{MockCommand, MockCommit, MockGitClient, MockPush, SystemGitClient, VcsClient};
pub use error::GitError;
pub use version::GitVersion;
