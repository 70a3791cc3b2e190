//! trunkflow - opinionated branch integration on top of the git CLI
//!
//! Commits and amends land on trunk only; integration merges trunk into a
//! shared integration branch (or trunk itself) and publishes after every
//! state-changing step.

pub mod checks;
pub mod config;
pub mod git;
pub mod logging;
pub mod workflow;
