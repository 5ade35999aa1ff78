//! CLI argument parsing module for bumpbot

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Dependency update driver for one repository directory
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bumpbot",
    version,
    about = "Checks one repository directory for dependency updates and opens a pull request"
)]
pub struct CliArgs {
    // Target
    /// Repository in owner/name form
    #[arg(long, env = "BUMPBOT_REPO")]
    pub repo: Option<String>,

    /// Directory inside the repository holding the dependency files
    #[arg(long, env = "BUMPBOT_DIRECTORY", default_value = "/")]
    pub directory: String,

    /// Git hosting provider (github, gitlab, bitbucket)
    #[arg(long, default_value = "github")]
    pub provider: String,

    /// Package manager of the dependency files
    #[arg(long, default_value = "cargo")]
    pub package_manager: String,

    /// Branch to operate against (default branch when omitted)
    #[arg(long)]
    pub branch: Option<String>,

    /// Commit to check out after cloning
    #[arg(long)]
    pub commit: Option<String>,

    /// Access token for the repository host
    #[arg(long, env = "BUMPBOT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    // Selection
    /// Update only these dependencies (can be specified multiple times)
    #[arg(long = "dependency", action = ArgAction::Append)]
    pub dependencies: Vec<String>,

    /// Only update dependencies with a security advisory
    #[arg(long)]
    pub security_updates_only: bool,

    /// JSON file with security advisories
    #[arg(long)]
    pub security_advisories_file: Option<PathBuf>,

    /// Never move to matching versions: name or name:requirement (can be
    /// specified multiple times)
    #[arg(long = "ignore", action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// How requirements are rewritten (bump_versions,
    /// bump_versions_if_necessary, widen_ranges, lockfile_only)
    #[arg(long)]
    pub requirements_update_strategy: Option<String>,

    /// Refuse dependencies fetched from outside the registry
    #[arg(long)]
    pub reject_external_code: bool,

    /// Vendor dependencies alongside the updated files
    #[arg(long)]
    pub vendor: bool,

    /// Collaborator option as key=value (can be specified multiple times)
    #[arg(long = "option", action = ArgAction::Append)]
    pub options: Vec<String>,

    // Actions
    /// Cache steps to reuse between runs (files)
    #[arg(long = "cache", action = ArgAction::Append)]
    pub cache: Vec<String>,

    /// Directory under the working directory where clones are kept
    #[arg(long, default_value = "tmp")]
    pub clone_root: PathBuf,

    /// Write updated files into the local clone
    #[arg(long)]
    pub write: bool,

    /// Open a pull request with the updated files
    #[arg(long)]
    pub pull_request: bool,

    /// Assign the pull request to this numeric user id (can be specified
    /// multiple times)
    #[arg(long = "assignee", env = "BUMPBOT_ASSIGNEE", action = ArgAction::Append)]
    pub assignees: Vec<u64>,

    /// Do not add the language label to pull requests
    #[arg(long)]
    pub no_label_language: bool,

    // Output
    /// Output a JSON summary instead of progress lines
    #[arg(long)]
    pub json: bool,

    /// Show changes to the dependency files in diff format
    #[arg(long)]
    pub diff: bool,

    /// Suppress progress lines and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub debug: bool,
}
