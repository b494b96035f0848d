//! Helpers for publishing a Static Web App from a local workspace: locate
//! build-configuration values in GitHub workflow files and bring a git
//! checkout into a publishable state.

pub mod config;
pub mod git;
pub mod prompt;
pub mod workflow;
pub mod workspace;
