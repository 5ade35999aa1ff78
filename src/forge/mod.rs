//! Pull request creation on git forges
//!
//! This module provides:
//! - The `PullRequestCreator` trait the run submits updates through
//! - `PullRequestMessage`: branch name, title, body and commit message
//! - `GithubCreator`: the GitHub REST API implementation

mod github;

pub use github::GithubCreator;

use crate::domain::{Credential, Dependency, DependencyFile, Provider, PullRequest, Source};
use crate::error::{AppError, PullRequestError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static BRANCH_UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._\-/]+").unwrap());

/// Everything needed to open one pull request
#[derive(Debug, Clone)]
pub struct PullRequestRequest {
    /// Repository, directory and branch the update targets
    pub source: Source,
    /// Commit the update branch starts from
    pub base_commit: String,
    /// The updated dependencies
    pub dependencies: Vec<Dependency>,
    /// The updated dependency files
    pub files: Vec<DependencyFile>,
    /// Package manager of the update
    pub package_manager: String,
    /// Numeric user ids to assign
    pub assignees: Vec<u64>,
    /// Add the ecosystem language label
    pub label_language: bool,
    /// Language label of the ecosystem (e.g. `rust`)
    pub language_label: String,
}

impl PullRequestRequest {
    /// Labels to add to the pull request
    pub fn labels(&self) -> Vec<String> {
        let mut labels = vec!["dependencies".to_string()];
        if self.label_language {
            labels.push(self.language_label.clone());
        }
        labels
    }
}

/// Opens pull requests for an update
#[async_trait]
pub trait PullRequestCreator: Send + Sync {
    /// Create the branch, commit and pull request
    async fn create(&self, request: &PullRequestRequest) -> Result<PullRequest, AppError>;
}

/// Build the pull request creator for a provider
pub fn creator_for(
    provider: Provider,
    credentials: &[Credential],
) -> Result<Box<dyn PullRequestCreator>, AppError> {
    match provider {
        Provider::Github => Ok(Box::new(GithubCreator::new(credentials)?)),
        other => Err(PullRequestError::UnsupportedProvider {
            provider: other.to_string(),
        }
        .into()),
    }
}

/// Text of a pull request and its commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestMessage {
    /// Head branch name
    pub branch: String,
    /// Pull request title
    pub title: String,
    /// Pull request body
    pub body: String,
    /// Commit message
    pub commit_message: String,
}

fn sentence_list(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn version_change(dependency: &Dependency) -> String {
    match &dependency.previous_version {
        Some(previous) => format!("from {} to {}", previous, dependency.display_version()),
        None => format!("to {}", dependency.display_version()),
    }
}

impl PullRequestMessage {
    /// Build the message for an update request
    pub fn build(request: &PullRequestRequest) -> Self {
        let dependencies = &request.dependencies;
        let names: Vec<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();

        let mut title = match dependencies.as_slice() {
            [single] => format!("Bump {} {}", single.name, version_change(single)),
            _ => format!("Bump {}", sentence_list(&names)),
        };
        if !request.source.is_root_directory() {
            title.push_str(&format!(" in {}", request.source.directory));
        }

        let body = dependencies
            .iter()
            .map(|d| format!("Bumps {} {}.", d.name, version_change(d)))
            .collect::<Vec<_>>()
            .join("\n");

        let leaf = match dependencies.as_slice() {
            [single] => format!("{}-{}", single.name, single.display_version()),
            _ => names.join("-and-"),
        };
        let directory = request.source.directory.trim_matches('/');
        let raw = [
            "bumpbot",
            request.package_manager.as_str(),
            directory,
            leaf.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
        let branch = BRANCH_UNSAFE_RE.replace_all(&raw, "-").to_string();

        let commit_message = format!("{}\n\n{}", title, body);

        Self {
            branch,
            title,
            body,
            commit_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Requirement;

    fn bumped(name: &str, from: Option<&str>, to: &str) -> Dependency {
        Dependency::new(name, from.map(String::from), "cargo")
            .with_requirement(Requirement::new("Cargo.toml", "1", "dependencies"))
            .updated_to(to, Vec::new())
    }

    fn request(directory: &str, dependencies: Vec<Dependency>) -> PullRequestRequest {
        PullRequestRequest {
            source: Source::new(Provider::Github, "owner/repo").with_directory(directory),
            base_commit: "abc123".to_string(),
            dependencies,
            files: Vec::new(),
            package_manager: "cargo".to_string(),
            assignees: Vec::new(),
            label_language: true,
            language_label: "rust".to_string(),
        }
    }

    #[test]
    fn test_single_dependency_message() {
        let message =
            PullRequestMessage::build(&request("/", vec![bumped("serde", Some("1.0.0"), "1.2.0")]));
        assert_eq!(message.title, "Bump serde from 1.0.0 to 1.2.0");
        assert_eq!(message.branch, "bumpbot/cargo/serde-1.2.0");
        assert_eq!(message.body, "Bumps serde from 1.0.0 to 1.2.0.");
        assert_eq!(
            message.commit_message,
            "Bump serde from 1.0.0 to 1.2.0\n\nBumps serde from 1.0.0 to 1.2.0."
        );
    }

    #[test]
    fn test_nested_directory_message() {
        let message = PullRequestMessage::build(&request(
            "/crates/core",
            vec![bumped("serde", Some("1.0.0"), "1.2.0")],
        ));
        assert_eq!(message.title, "Bump serde from 1.0.0 to 1.2.0 in /crates/core");
        assert_eq!(message.branch, "bumpbot/cargo/crates/core/serde-1.2.0");
    }

    #[test]
    fn test_multiple_dependencies_message() {
        let message = PullRequestMessage::build(&request(
            "/",
            vec![
                bumped("serde", Some("1.0.0"), "1.2.0"),
                bumped("tokio", Some("1.28.0"), "1.40.0"),
                bumped("anyhow", None, "1.0.90"),
            ],
        ));
        assert_eq!(message.title, "Bump serde, tokio and anyhow");
        assert_eq!(message.branch, "bumpbot/cargo/serde-and-tokio-and-anyhow");
        assert!(message.body.contains("Bumps anyhow to 1.0.90."));
        assert_eq!(message.body.lines().count(), 3);
    }

    #[test]
    fn test_labels() {
        let mut req = request("/", Vec::new());
        assert_eq!(req.labels(), vec!["dependencies", "rust"]);
        req.label_language = false;
        assert_eq!(req.labels(), vec!["dependencies"]);
    }

    #[test]
    fn test_creator_for_unsupported_provider() {
        let creds = vec![Credential::git_source("gitlab.com", "token")];
        let err = creator_for(Provider::Gitlab, &creds).err().unwrap();
        assert!(matches!(
            err,
            AppError::PullRequest(PullRequestError::UnsupportedProvider { .. })
        ));
    }
}
