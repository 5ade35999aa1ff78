//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of a run summary
//! - Structured per-dependency update/skip information

use crate::domain::{Dependency, PullRequest, RunOutcome, RunSummary, SkipReason, UpdateResult};
use crate::output::SummaryFormatter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of the full run
#[derive(Serialize)]
struct JsonOutput<'a> {
    repo: &'a str,
    directory: &'a str,
    package_manager: &'a str,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    outcome: &'a RunOutcome,
    summary: JsonSummary,
    updates: Vec<JsonUpdate<'a>>,
    skips: Vec<JsonSkip<'a>>,
    updated_dependencies: &'a [Dependency],
    updated_files: Vec<JsonFile<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    written_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<&'a PullRequest>,
}

#[derive(Serialize)]
struct JsonSummary {
    checked: usize,
    updates: usize,
    skips: usize,
}

#[derive(Serialize)]
struct JsonUpdate<'a> {
    name: &'a str,
    from: Option<&'a str>,
    to: Option<&'a str>,
    unlock: &'static str,
}

#[derive(Serialize)]
struct JsonSkip<'a> {
    name: &'a str,
    version: Option<&'a str>,
    reason: &'a SkipReason,
    message: String,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    name: &'a str,
    directory: &'a str,
}

fn to_json(summary: &RunSummary) -> JsonOutput<'_> {
    let updates = summary
        .updates()
        .filter_map(|result| match result {
            UpdateResult::Update {
                dependency,
                target_version,
                scope,
                ..
            } => Some(JsonUpdate {
                name: &dependency.name,
                from: dependency.version.as_deref(),
                to: target_version.as_deref(),
                unlock: scope.as_str(),
            }),
            UpdateResult::Skip { .. } => None,
        })
        .collect();

    let skips = summary
        .skips()
        .filter_map(|result| match result {
            UpdateResult::Skip { dependency, reason } => Some(JsonSkip {
                name: &dependency.name,
                version: dependency.version.as_deref(),
                reason,
                message: reason.to_string(),
            }),
            UpdateResult::Update { .. } => None,
        })
        .collect();

    JsonOutput {
        repo: &summary.repo,
        directory: &summary.directory,
        package_manager: &summary.package_manager,
        started_at: summary.started_at,
        finished_at: summary.finished_at,
        outcome: &summary.outcome,
        summary: JsonSummary {
            checked: summary.total_checked(),
            updates: summary.total_updates(),
            skips: summary.total_skips(),
        },
        updates,
        skips,
        updated_dependencies: &summary.updated_dependencies,
        updated_files: summary
            .updated_files
            .iter()
            .map(|f| JsonFile {
                name: &f.name,
                directory: &f.directory,
            })
            .collect(),
        written_files: summary
            .written_files
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        pull_request: summary.pull_request.as_ref(),
    }
}

impl SummaryFormatter for JsonFormatter {
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let json =
            serde_json::to_string_pretty(&to_json(summary)).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)?;
        Ok(())
    }
}
