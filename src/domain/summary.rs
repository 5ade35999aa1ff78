//! Run summary types
//!
//! Provides the record of one update run: per-dependency results, the
//! collected updates, the generated files and how the run ended.

use super::{Dependency, DependencyFile, UpdateResult};
use crate::error::FetchErrorDetails;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A pull request opened by the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Pull request number on the forge
    pub number: u64,
    /// Web URL of the pull request
    pub url: String,
    /// Head branch of the pull request
    pub branch: String,
    /// Pull request title
    pub title: String,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The fetcher returned no dependency files
    NoDependencyFiles,
    /// A recognized fetch failure ended the run early
    FetchErrorHandled(FetchErrorDetails),
    /// Every dependency was skipped
    NothingToUpdate,
    /// Updated file contents were produced
    FilesUpdated,
    /// Updated files were submitted as a pull request
    PullRequestCreated,
}

impl RunOutcome {
    /// Returns true if the run produced updated files
    pub fn has_updates(&self) -> bool {
        matches!(
            self,
            RunOutcome::FilesUpdated | RunOutcome::PullRequestCreated
        )
    }
}

/// Overall record of an update run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Repository in `owner/name` form
    pub repo: String,
    /// Directory the run operated on
    pub directory: String,
    /// Package manager of the run
    pub package_manager: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Decision for every checked dependency, in check order
    pub results: Vec<UpdateResult>,
    /// The accumulated update collection
    pub updated_dependencies: Vec<Dependency>,
    /// Dependency files as fetched
    #[serde(skip)]
    pub original_files: Vec<DependencyFile>,
    /// Dependency files as rewritten by the updater
    pub updated_files: Vec<DependencyFile>,
    /// Files written into the local clone
    pub written_files: Vec<PathBuf>,
    /// The pull request, when one was opened
    pub pull_request: Option<PullRequest>,
    /// How the run ended
    pub outcome: RunOutcome,
}

impl RunSummary {
    /// Creates an empty summary for a run that is just starting
    pub fn new(
        repo: impl Into<String>,
        directory: impl Into<String>,
        package_manager: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            directory: directory.into(),
            package_manager: package_manager.into(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            updated_dependencies: Vec::new(),
            original_files: Vec::new(),
            updated_files: Vec::new(),
            written_files: Vec::new(),
            pull_request: None,
            outcome: RunOutcome::NothingToUpdate,
        }
    }

    /// Marks the run finished with `outcome`
    pub fn finish(&mut self, outcome: RunOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }

    /// Returns the number of dependencies checked
    pub fn total_checked(&self) -> usize {
        self.results.len()
    }

    /// Returns the number of dependencies with an update
    pub fn total_updates(&self) -> usize {
        self.results.iter().filter(|r| r.is_update()).count()
    }

    /// Returns the number of skipped dependencies
    pub fn total_skips(&self) -> usize {
        self.results.iter().filter(|r| r.is_skip()).count()
    }

    /// Returns all update results
    pub fn updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_update())
    }

    /// Returns all skip results
    pub fn skips(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_skip())
    }

    /// Returns the fetched version of an updated file
    pub fn original_file(&self, updated: &DependencyFile) -> Option<&DependencyFile> {
        self.original_files
            .iter()
            .find(|f| f.name == updated.name && f.directory == updated.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SkipReason, UnlockScope};

    fn sample_dependency(name: &str) -> Dependency {
        Dependency::new(name, Some("1.0.0".to_string()), "cargo")
    }

    #[test]
    fn test_new_summary_is_empty() {
        let summary = RunSummary::new("owner/repo", "/", "cargo");
        assert_eq!(summary.total_checked(), 0);
        assert_eq!(summary.outcome, RunOutcome::NothingToUpdate);
        assert!(summary.finished_at.is_none());
    }

    #[test]
    fn test_counts() {
        let mut summary = RunSummary::new("owner/repo", "/", "cargo");
        summary.results.push(UpdateResult::Update {
            dependency: sample_dependency("serde"),
            target_version: Some("1.2.0".to_string()),
            scope: UnlockScope::Own,
            updated: vec![sample_dependency("serde").updated_to("1.2.0", vec![])],
        });
        summary
            .results
            .push(UpdateResult::skip(sample_dependency("tokio"), SkipReason::UpToDate));

        assert_eq!(summary.total_checked(), 2);
        assert_eq!(summary.total_updates(), 1);
        assert_eq!(summary.total_skips(), 1);
        assert_eq!(summary.updates().next().unwrap().dependency().name, "serde");
    }

    #[test]
    fn test_finish_sets_outcome() {
        let mut summary = RunSummary::new("owner/repo", "/", "cargo");
        summary.finish(RunOutcome::FilesUpdated);
        assert!(summary.outcome.has_updates());
        assert!(summary.finished_at.is_some());
    }

    #[test]
    fn test_original_file_lookup() {
        let mut summary = RunSummary::new("owner/repo", "/", "cargo");
        let original = DependencyFile::new("Cargo.toml", "/", "old");
        summary.original_files.push(original.clone());
        let updated = original.with_content("new");
        assert_eq!(summary.original_file(&updated).unwrap().content, "old");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&RunOutcome::NoDependencyFiles).unwrap();
        assert_eq!(json, r#"{"kind":"no_dependency_files"}"#);
    }
}
