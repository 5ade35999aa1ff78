//! Output for update runs
//!
//! This module provides:
//! - Run events and the `Reporter` trait used for progress narration
//! - Text output for human-readable display
//! - JSON output for machine processing
//! - Diff output for showing file changes

mod diff;
mod json;
mod text;

pub use diff::DiffFormatter;
pub use json::JsonFormatter;
pub use text::{TextFormatter, TextReporter, VersionChangeType};

use crate::domain::{
    ConflictingDependency, PullRequest, RequirementsUpdateStrategy, RunSummary, UnlockDecision,
};
use crate::error::FetchErrorDetails;
use std::io::Write;
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable narration
    #[default]
    Text,
    /// JSON summary for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No narration
    Quiet,
    /// Narrate every step
    #[default]
    Normal,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Append a diff of the updated files
    pub diff: bool,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            diff: false,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, diff: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            diff,
            color: true,
        }
    }

    /// Returns true if progress lines should be printed
    pub fn narrates(&self) -> bool {
        self.format == OutputFormat::Text && self.verbosity == Verbosity::Normal
    }

    /// Returns true if a spinner should stand in for narration
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Json && self.verbosity == Verbosity::Normal
    }
}

/// A step of an update run, reported as it happens
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent<'a> {
    /// Fetching dependency files started
    Fetching {
        package_manager: &'a str,
        repo: &'a str,
    },
    /// An existing clone is reused
    ReadingClone { path: &'a Path },
    /// The repository is being cloned
    Cloning { path: &'a Path },
    /// The clone is being pinned to a commit
    CheckingOutCommit { commit: &'a str },
    /// A recognized fetch failure ended the run
    FetchErrorHandled(&'a FetchErrorDetails),
    /// Parsing dependency files started
    Parsing,
    /// The dependencies that will be checked
    UpdatingDependencies { names: Vec<&'a str> },
    /// Checking one dependency started
    DependencyStarted {
        name: &'a str,
        version: Option<&'a str>,
        vulnerable: bool,
    },
    /// Position of the dependency in the check loop
    CheckingForUpdates { index: usize, total: usize },
    /// Latest published version
    LatestVersion { version: Option<&'a str> },
    /// Security-only run and the dependency is not vulnerable
    NotVulnerable { version_known: bool },
    /// Lowest non-vulnerable version of a vulnerable dependency
    SecurityFix { version: Option<&'a str> },
    /// Already on the latest version
    UpToDate,
    /// Version the update would move to
    LatestAllowedVersion { version: Option<&'a str> },
    /// The unlock decision
    Unlock(UnlockDecision),
    /// The checker's requirement update strategy
    Strategy(RequirementsUpdateStrategy),
    /// No unlock scope permits an update
    UpdateNotPossible { security: bool },
    /// Dependencies blocking an update
    Conflicts(&'a [ConflictingDependency]),
    /// A collected dependency is being updated
    Updating {
        name: &'a str,
        previous_version: Option<&'a str>,
        version: Option<&'a str>,
    },
    /// An updated file was written to the clone
    WroteFile { path: &'a Path },
    /// The pull request was opened
    Submitted(&'a PullRequest),
    /// The run completed
    Done,
}

/// Receives run events for narration
pub trait Reporter: Send + Sync {
    /// Report a single event
    fn report(&self, event: &RunEvent<'_>);
}

/// Reporter that discards every event
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &RunEvent<'_>) {}
}

/// Trait for run summary formatters
pub trait SummaryFormatter {
    /// Format and write the run summary
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create the progress reporter for a configuration
pub fn create_reporter(config: &OutputConfig) -> Box<dyn Reporter> {
    if config.narrates() {
        Box::new(TextReporter::with_color(config.color))
    } else {
        Box::new(NullReporter)
    }
}

/// Create the summary formatter for a configuration
pub fn create_formatter(config: &OutputConfig) -> Option<Box<dyn SummaryFormatter>> {
    match (config.format, config.verbosity) {
        (OutputFormat::Json, _) => Some(Box::new(JsonFormatter::new())),
        (OutputFormat::Text, Verbosity::Normal) => {
            Some(Box::new(TextFormatter::with_color(config.color)))
        }
        (OutputFormat::Text, Verbosity::Quiet) => None,
    }
}

/// Write the end-of-run output: the summary, then the diff when requested
pub fn write_summary(
    config: &OutputConfig,
    summary: &RunSummary,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    if let Some(formatter) = create_formatter(config) {
        formatter.format(summary, writer)?;
    }
    if config.diff {
        DiffFormatter::with_color(config.color && config.format == OutputFormat::Text)
            .format(summary, writer)?;
    }
    Ok(())
}
