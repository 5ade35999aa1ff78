//! Run configuration derived from CLI flags and the environment

use crate::cli::CliArgs;
use crate::domain::{
    normalize_directory, Credential, IgnoreCondition, Provider, RequirementsUpdateStrategy,
    SecurityAdvisory, Source,
};
use crate::ecosystem::{Ecosystem, UpdaterOptions};
use crate::error::{AppError, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Steps whose results may be reused from a previous run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStep {
    /// Reuse an existing clone instead of cloning again
    Files,
}

impl FromStr for CacheStep {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "files" => Ok(CacheStep::Files),
            other => Err(ConfigError::InvalidCacheStep {
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable configuration of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Credentials handed to every collaborator
    pub credentials: Vec<Credential>,
    /// Hosting provider
    pub provider: Provider,
    /// Repository in `owner/name` form
    pub repo: String,
    /// Directory inside the repository
    pub directory: String,
    /// Package manager name
    pub package_manager: String,
    /// Explicit, lower-cased dependency names; `None` means top-level only
    pub dependency_names: Option<Vec<String>>,
    /// Branch to operate against
    pub branch: Option<String>,
    /// Commit to pin the clone to
    pub commit: Option<String>,
    /// Reusable steps
    pub cache_steps: Vec<CacheStep>,
    /// Write updated files into the clone
    pub write: bool,
    /// Open a pull request
    pub pull_request: bool,
    /// Refuse non-registry dependencies
    pub reject_external_code: bool,
    /// Requirement update strategy override
    pub requirements_update_strategy: Option<RequirementsUpdateStrategy>,
    /// Known advisories
    pub security_advisories: Vec<SecurityAdvisory>,
    /// Only update vulnerable dependencies
    pub security_updates_only: bool,
    /// Vendor dependencies
    pub vendor_dependencies: bool,
    /// Versions never moved to
    pub ignore_conditions: Vec<IgnoreCondition>,
    /// Collaborator options
    pub options: UpdaterOptions,
    /// Pull request assignees (numeric user ids)
    pub assignees: Vec<u64>,
    /// Label pull requests with the ecosystem language
    pub label_language: bool,
    /// Where the repository is cloned
    pub repo_contents_path: PathBuf,
}

impl RunConfig {
    /// Build the configuration, resolving the clone path against `cwd`
    pub fn from_args(args: &CliArgs, cwd: &Path) -> Result<Self, AppError> {
        let repo = args
            .repo
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingRepository)?
            .to_string();
        let (owner, name) = split_repo(&repo)?;

        let provider: Provider = args
            .provider
            .parse()
            .map_err(|message| ConfigError::InvalidProvider { message })?;

        let credentials = args
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|token| vec![Credential::git_source(provider.hostname(), token)])
            .unwrap_or_default();

        let dependency_names = if args.dependencies.is_empty() {
            None
        } else {
            Some(args.dependencies.iter().map(|d| d.to_lowercase()).collect())
        };

        let cache_steps = args
            .cache
            .iter()
            .map(|s| s.parse::<CacheStep>())
            .collect::<Result<Vec<_>, _>>()?;

        let requirements_update_strategy = args
            .requirements_update_strategy
            .as_deref()
            .map(|s| {
                s.parse::<RequirementsUpdateStrategy>()
                    .map_err(|value| ConfigError::InvalidStrategy { value })
            })
            .transpose()?;

        let ignore_conditions = args
            .ignore
            .iter()
            .map(|value| {
                value
                    .parse::<IgnoreCondition>()
                    .map_err(|message| ConfigError::InvalidIgnoreCondition {
                        value: value.clone(),
                        message,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let security_advisories = match &args.security_advisories_file {
            Some(path) => load_advisories(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            credentials,
            provider,
            repo_contents_path: cwd.join(&args.clone_root).join(owner).join(name),
            repo,
            directory: parse_directory(&args.directory)?,
            package_manager: args.package_manager.trim().to_lowercase(),
            dependency_names,
            branch: args.branch.clone(),
            commit: args.commit.clone(),
            cache_steps,
            write: args.write,
            pull_request: args.pull_request,
            reject_external_code: args.reject_external_code,
            requirements_update_strategy,
            security_advisories,
            security_updates_only: args.security_updates_only,
            vendor_dependencies: args.vendor,
            ignore_conditions,
            options: parse_options(&args.options)?,
            assignees: args.assignees.clone(),
            label_language: !args.no_label_language,
        })
    }

    /// Returns true if `step` may be reused
    pub fn caches(&self, step: CacheStep) -> bool {
        self.cache_steps.contains(&step)
    }

    /// The source a run fetches from
    pub fn source(&self) -> Source {
        Source::new(self.provider, self.repo.clone())
            .with_directory(self.directory.clone())
            .with_branch(self.branch.clone())
            .with_commit(self.commit.clone())
    }

    /// Check options against what the ecosystem supports
    pub fn validate_for(&self, ecosystem: &dyn Ecosystem) -> Result<(), AppError> {
        if self.vendor_dependencies && !ecosystem.supports_vendoring() {
            return Err(ConfigError::UnsupportedOption {
                option: "--vendor".to_string(),
                package_manager: ecosystem.package_manager().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn split_repo(repo: &str) -> Result<(&str, &str), ConfigError> {
    match repo.split_once('/') {
        Some((owner, name)) if is_path_segment(owner) && is_path_segment(name) => {
            Ok((owner, name))
        }
        _ => Err(ConfigError::InvalidRepository {
            value: repo.to_string(),
        }),
    }
}

/// Both repository halves become clone path components
fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

/// Normalize `--directory`, refusing components that leave the clone
fn parse_directory(directory: &str) -> Result<String, ConfigError> {
    if directory.split(['/', '\\']).any(|c| c.trim() == "..") {
        return Err(ConfigError::InvalidDirectory {
            value: directory.to_string(),
        });
    }
    Ok(normalize_directory(directory))
}

fn parse_options(raw: &[String]) -> Result<UpdaterOptions, ConfigError> {
    raw.iter()
        .map(|option| match option.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidOption {
                value: option.clone(),
            }),
        })
        .collect()
}

/// Load advisories from a JSON array file
pub fn load_advisories(path: &Path) -> Result<Vec<SecurityAdvisory>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Advisories {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Advisories {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
