//! Text output for human-readable display
//!
//! This module provides:
//! - Progress narration of run events with colors
//! - Semantic version change type indication (major/minor/patch)
//! - A closing summary of the run

use crate::domain::{RunOutcome, RunSummary, UpdateResult};
use crate::output::{Reporter, RunEvent, SummaryFormatter};
use crate::update::parse_version;
use colored::Colorize;
use std::io::Write;

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    pub fn from_versions(old: &str, new: &str) -> Self {
        match (parse_version(old), parse_version(new)) {
            (Some(old), Some(new)) => {
                if new.major != old.major {
                    VersionChangeType::Major
                } else if new.minor != old.minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Narrates run events on stdout
pub struct TextReporter {
    color: bool,
}

impl TextReporter {
    /// Create a new text reporter with colors
    pub fn new() -> Self {
        Self { color: true }
    }

    /// Create a new text reporter with color option
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render an event as the lines to print, or `None` for silent events
    pub fn render(&self, event: &RunEvent<'_>) -> Option<String> {
        let line = match event {
            RunEvent::Fetching {
                package_manager,
                repo,
            } => format!(
                "Fetching {} dependency files for {}",
                package_manager,
                self.paint(repo, |s| s.bold())
            ),
            RunEvent::ReadingClone { path } => {
                format!("=> reading cloned repo from {}", path.display())
            }
            RunEvent::Cloning { path } => format!("=> cloning into {}", path.display()),
            RunEvent::CheckingOutCommit { commit } => {
                format!("=> checking out commit {}", commit)
            }
            RunEvent::FetchErrorHandled(details) => format!(
                " => handled error whilst fetching dependencies: {}",
                self.paint(&details.to_string(), |s| s.yellow())
            ),
            RunEvent::Parsing => "=> parsing dependency files".to_string(),
            RunEvent::UpdatingDependencies { names } => format!(
                "=> updating {} dependencies: {}",
                names.len(),
                names.join(", ")
            ),
            RunEvent::DependencyStarted {
                name,
                version,
                vulnerable,
            } => {
                let marker = if *vulnerable {
                    format!(" {}", self.paint("(vulnerable 🚨)", |s| s.red()))
                } else {
                    String::new()
                };
                format!(
                    "\n=== {} ({}){}",
                    self.paint(name, |s| s.bold()),
                    version.unwrap_or(""),
                    marker
                )
            }
            RunEvent::CheckingForUpdates { index, total } => {
                format!(" => checking for updates {}/{}", index, total)
            }
            RunEvent::LatestVersion { version } => format!(
                " => latest available version is {}",
                version.unwrap_or("")
            ),
            RunEvent::NotVulnerable {
                version_known: true,
            } => "    (no security update needed as it's not vulnerable)".to_string(),
            RunEvent::NotVulnerable {
                version_known: false,
            } => "    (can't update vulnerable dependencies for projects without a lockfile \
                  as the currently installed version isn't known 🚨)"
                .to_string(),
            RunEvent::SecurityFix {
                version: Some(version),
            } => format!(
                " => earliest available non-vulnerable version is {}",
                version
            ),
            RunEvent::SecurityFix { version: None } => {
                " => there is no available non-vulnerable version".to_string()
            }
            RunEvent::UpToDate => {
                self.paint("    (no update needed as it's already up-to-date)", |s| {
                    s.dimmed()
                })
            }
            RunEvent::LatestAllowedVersion { version } => format!(
                " => latest allowed version is {}",
                version.unwrap_or("")
            ),
            RunEvent::Unlock(decision) => format!(" => requirements to unlock: {}", decision),
            RunEvent::Strategy(strategy) => {
                format!(" => requirements update strategy: {}", strategy)
            }
            RunEvent::UpdateNotPossible { security: true } => {
                self.paint("    (no security update possible 🙅‍♀️)", |s| s.red())
            }
            RunEvent::UpdateNotPossible { security: false } => {
                self.paint("    (no update possible 🙅‍♀️)", |s| s.yellow())
            }
            RunEvent::Conflicts(conflicts) => {
                if conflicts.is_empty() {
                    return None;
                }
                let mut lines = vec![
                    " => The update is not possible because of the following conflicting \
                     dependencies:"
                        .to_string(),
                ];
                lines.extend(conflicts.iter().map(|c| format!("   {}", c.explanation)));
                lines.join("\n")
            }
            RunEvent::Updating {
                name,
                previous_version,
                version,
            } => {
                let from = previous_version.unwrap_or("");
                let to = version.unwrap_or("");
                let change = VersionChangeType::from_versions(from, to);
                let label = if self.color {
                    change.colored_label()
                } else {
                    change.label().to_string()
                };
                format!(" - Updating {} (from {} to {}) [{}]", name, from, to, label)
            }
            RunEvent::WroteFile { path } => format!(" => wrote {}", path.display()),
            RunEvent::Submitted(pull_request) => format!(
                " submitted {}",
                self.paint(&pull_request.url, |s| s.cyan())
            ),
            RunEvent::Done => self.paint("Done", |s| s.green()),
        };
        Some(line)
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TextReporter {
    fn report(&self, event: &RunEvent<'_>) {
        if let Some(line) = self.render(event) {
            println!("{}", line);
        }
    }
}

/// Text formatter for the closing run summary
pub struct TextFormatter {
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self { color: true }
    }

    /// Create a new text formatter with color option
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn format_update_line(
        &self,
        result: &UpdateResult,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if let UpdateResult::Update {
            dependency,
            target_version,
            scope,
            ..
        } = result
        {
            let old = dependency.display_version();
            let new = target_version.as_deref().unwrap_or("?");
            let change = VersionChangeType::from_versions(old, new);
            let name = format!("{:width$}", dependency.name, width = max_name_len);
            if self.color {
                writeln!(
                    writer,
                    "  {} {} {} {} [{}] (unlock {})",
                    name,
                    old.dimmed(),
                    "→".dimmed(),
                    new.bright_white().bold(),
                    change.colored_label(),
                    scope
                )?;
            } else {
                writeln!(
                    writer,
                    "  {} {} → {} [{}] (unlock {})",
                    name,
                    old,
                    new,
                    change.label(),
                    scope
                )?;
            }
        }
        Ok(())
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for TextFormatter {
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        match &summary.outcome {
            RunOutcome::NoDependencyFiles => {
                return writeln!(writer, "No dependency files found");
            }
            RunOutcome::FetchErrorHandled(details) => {
                return writeln!(writer, "Nothing updated: {}", details);
            }
            _ => {}
        }

        let max_name_len = summary
            .updates()
            .map(|r| r.dependency().name.len())
            .max()
            .unwrap_or(0);

        if summary.total_updates() > 0 {
            writeln!(writer)?;
            for result in summary.updates() {
                self.format_update_line(result, max_name_len, writer)?;
            }
        }

        writeln!(
            writer,
            "\n{} dependencies checked: {} to update, {} skipped",
            summary.total_checked(),
            summary.total_updates(),
            summary.total_skips()
        )?;

        for path in &summary.written_files {
            writeln!(writer, "  wrote {}", path.display())?;
        }
        if let Some(pull_request) = &summary.pull_request {
            writeln!(
                writer,
                "Pull request #{}: {}",
                pull_request.number, pull_request.url
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConflictingDependency, Dependency, PullRequest, SkipReason, UnlockDecision, UnlockScope,
    };
    use crate::error::FetchErrorDetails;
    use std::path::Path;

    fn reporter() -> TextReporter {
        TextReporter::with_color(false)
    }

    #[test]
    fn test_version_change_type() {
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "2.0.0"),
            VersionChangeType::Major
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.2.0"),
            VersionChangeType::Minor
        );
        assert_eq!(
            VersionChangeType::from_versions("1.0.0", "1.0.1"),
            VersionChangeType::Patch
        );
        assert_eq!(
            VersionChangeType::from_versions("", "1.0.1"),
            VersionChangeType::Unknown
        );
    }

    #[test]
    fn test_render_dependency_started_vulnerable() {
        let line = reporter()
            .render(&RunEvent::DependencyStarted {
                name: "serde",
                version: Some("1.0.0"),
                vulnerable: true,
            })
            .unwrap();
        assert_eq!(line, "\n=== serde (1.0.0) (vulnerable 🚨)");
    }

    #[test]
    fn test_render_check_progress() {
        let r = reporter();
        assert_eq!(
            r.render(&RunEvent::CheckingForUpdates { index: 2, total: 5 })
                .unwrap(),
            " => checking for updates 2/5"
        );
        assert_eq!(
            r.render(&RunEvent::Unlock(UnlockDecision::Unlock(UnlockScope::Own)))
                .unwrap(),
            " => requirements to unlock: own"
        );
        assert_eq!(
            r.render(&RunEvent::Unlock(UnlockDecision::UpdateNotPossible))
                .unwrap(),
            " => requirements to unlock: update_not_possible"
        );
    }

    #[test]
    fn test_render_fetch_error() {
        let details = FetchErrorDetails {
            error_type: "repo_not_found".to_string(),
            error_detail: "owner/repo".to_string(),
        };
        assert_eq!(
            reporter()
                .render(&RunEvent::FetchErrorHandled(&details))
                .unwrap(),
            " => handled error whilst fetching dependencies: repo_not_found owner/repo"
        );
    }

    #[test]
    fn test_render_conflicts() {
        let r = reporter();
        assert!(r.render(&RunEvent::Conflicts(&[])).is_none());

        let conflicts = vec![ConflictingDependency {
            name: "app".to_string(),
            version: None,
            requirement: Some("^1.0".to_string()),
            explanation: "app requires serde ^1.0".to_string(),
        }];
        let text = r.render(&RunEvent::Conflicts(&conflicts)).unwrap();
        assert!(text.contains("conflicting dependencies"));
        assert!(text.ends_with("   app requires serde ^1.0"));
    }

    #[test]
    fn test_render_updating_and_done() {
        let r = reporter();
        assert_eq!(
            r.render(&RunEvent::Updating {
                name: "serde",
                previous_version: Some("1.0.0"),
                version: Some("1.2.0"),
            })
            .unwrap(),
            " - Updating serde (from 1.0.0 to 1.2.0) [minor]"
        );
        assert_eq!(r.render(&RunEvent::Done).unwrap(), "Done");
        assert_eq!(
            r.render(&RunEvent::WroteFile {
                path: Path::new("/tmp/x/Cargo.toml")
            })
            .unwrap(),
            " => wrote /tmp/x/Cargo.toml"
        );
    }

    #[test]
    fn test_text_formatter_summary() {
        let mut summary = RunSummary::new("owner/repo", "/", "cargo");
        let dep = Dependency::new("serde", Some("1.0.0".to_string()), "cargo");
        summary.results.push(UpdateResult::Update {
            dependency: dep.clone(),
            target_version: Some("1.2.0".to_string()),
            scope: UnlockScope::Own,
            updated: vec![dep.updated_to("1.2.0", vec![])],
        });
        summary.results.push(UpdateResult::skip(
            Dependency::new("tokio", Some("1.49.0".to_string()), "cargo"),
            SkipReason::UpToDate,
        ));
        summary.pull_request = Some(PullRequest {
            number: 7,
            url: "https://github.com/owner/repo/pull/7".to_string(),
            branch: "bumpbot/cargo/serde-1.2.0".to_string(),
            title: "Bump serde from 1.0.0 to 1.2.0".to_string(),
        });
        summary.finish(RunOutcome::PullRequestCreated);

        let mut out = Vec::new();
        TextFormatter::with_color(false)
            .format(&summary, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("serde 1.0.0 → 1.2.0 [minor] (unlock own)"));
        assert!(text.contains("2 dependencies checked: 1 to update, 1 skipped"));
        assert!(text.contains("Pull request #7"));
    }

    #[test]
    fn test_text_formatter_no_files() {
        let mut summary = RunSummary::new("owner/repo", "/", "cargo");
        summary.finish(RunOutcome::NoDependencyFiles);
        let mut out = Vec::new();
        TextFormatter::with_color(false)
            .format(&summary, &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No dependency files found\n");
    }
}
