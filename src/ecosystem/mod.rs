//! Package ecosystem collaborators
//!
//! An ecosystem bundles the four components a run is wired from:
//! - `FileFetcher`: clones the repository and reads its dependency files
//! - `FileParser`: turns dependency files into dependency records
//! - `UpdateChecker`: answers version and unlock queries for one dependency
//! - `FileUpdater`: rewrites dependency files for a set of updates
//!
//! Ecosystems are looked up by package manager name with
//! [`for_package_manager`].

pub mod cargo;

use crate::domain::{
    ConflictingDependency, Credential, Dependency, DependencyFile, IgnoreCondition,
    RequirementsUpdateStrategy, SecurityAdvisory, Source, UnlockScope,
};
use crate::error::{AppError, ConfigError};
use crate::git::GitRunner;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub use cargo::CargoEcosystem;

/// Free-form options handed to collaborators (`--option key=value`)
pub type UpdaterOptions = BTreeMap<String, String>;

/// Arguments for building a file fetcher
#[derive(Clone)]
pub struct FetcherArgs {
    /// Repository, directory, branch and commit to fetch from
    pub source: Source,
    /// Credentials for the repository host
    pub credentials: Vec<Credential>,
    /// Local clone location
    pub repo_contents_path: PathBuf,
    /// Collaborator options
    pub options: UpdaterOptions,
    /// Git runner used to clone
    pub git: Arc<dyn GitRunner>,
}

/// Arguments for building a file parser
#[derive(Debug, Clone)]
pub struct ParserArgs {
    /// Fetched dependency files
    pub dependency_files: Vec<DependencyFile>,
    /// Local clone location
    pub repo_contents_path: PathBuf,
    /// Source the files were fetched from
    pub source: Source,
    /// Credentials for private registries
    pub credentials: Vec<Credential>,
    /// Refuse dependencies pulled from non-registry sources
    pub reject_external_code: bool,
}

/// Arguments for building an update checker for one dependency
#[derive(Debug, Clone)]
pub struct CheckerArgs {
    /// The dependency to check
    pub dependency: Dependency,
    /// Fetched dependency files
    pub dependency_files: Vec<DependencyFile>,
    /// Credentials for private registries
    pub credentials: Vec<Credential>,
    /// Local clone location
    pub repo_contents_path: PathBuf,
    /// Strategy override; `None` lets the checker choose
    pub requirements_update_strategy: Option<RequirementsUpdateStrategy>,
    /// Collaborator options
    pub options: UpdaterOptions,
    /// Advisories for this dependency
    pub security_advisories: Vec<SecurityAdvisory>,
    /// Versions the update must not move to
    pub ignore_conditions: Vec<IgnoreCondition>,
}

/// Arguments for building a file updater
#[derive(Debug, Clone)]
pub struct UpdaterArgs {
    /// The accumulated update collection
    pub dependencies: Vec<Dependency>,
    /// Fetched dependency files
    pub dependency_files: Vec<DependencyFile>,
    /// Credentials for private registries
    pub credentials: Vec<Credential>,
    /// Collaborator options
    pub options: UpdaterOptions,
}

/// Clones a repository and reads its dependency files
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Clone the repository into the configured clone path
    async fn clone_repo_contents(&self) -> Result<(), AppError>;

    /// Commit SHA the files were read at
    async fn commit(&self) -> Result<String, AppError>;

    /// Read the dependency files from the clone
    async fn files(&self) -> Result<Vec<DependencyFile>, AppError>;
}

/// Parses dependency files into dependency records
pub trait FileParser: Send + Sync {
    /// Parse every dependency, top-level and transitive
    fn parse(&self) -> Result<Vec<Dependency>, AppError>;
}

/// Answers update queries for a single dependency
pub trait UpdateChecker: Send + Sync {
    /// The dependency being checked
    fn dependency(&self) -> &Dependency;

    /// Returns true if the installed version is affected by an advisory
    fn vulnerable(&self) -> bool;

    /// Returns true if the installed version can be determined
    fn version_known(&self) -> bool;

    /// Latest published version
    fn latest_version(&self) -> Option<String>;

    /// Lowest published version without a known vulnerability
    fn lowest_security_fix_version(&self) -> Option<String>;

    /// Returns true if nothing newer is available
    fn up_to_date(&self) -> bool;

    /// Latest version the project's constraints allow
    fn latest_resolvable_version(&self) -> Option<String>;

    /// Lowest non-vulnerable version the project's constraints allow
    fn lowest_resolvable_security_fix_version(&self) -> Option<String>;

    /// Returns true if requirements may be changed by an update
    fn requirements_unlocked_or_can_be(&self) -> bool;

    /// Returns true if an update is possible within `scope`
    fn can_update(&self, scope: UnlockScope) -> Result<bool, AppError>;

    /// Dependencies whose requirements block the update
    fn conflicting_dependencies(&self) -> Vec<ConflictingDependency>;

    /// Every dependency record the update within `scope` changes
    fn updated_dependencies(&self, scope: UnlockScope) -> Result<Vec<Dependency>, AppError>;

    /// Strategy used to rewrite requirements, when the checker has one
    fn requirements_update_strategy(&self) -> Option<RequirementsUpdateStrategy> {
        None
    }
}

/// Produces updated dependency files
pub trait FileUpdater: Send + Sync {
    /// Files whose content changes, with the new content
    fn updated_dependency_files(&self) -> Result<Vec<DependencyFile>, AppError>;
}

/// Factory for an ecosystem's collaborators
#[async_trait]
pub trait Ecosystem: Send + Sync {
    /// Package manager name (e.g. `cargo`)
    fn package_manager(&self) -> &'static str;

    /// Language label added to pull requests
    fn language_label(&self) -> &'static str;

    /// Returns true if the ecosystem can vendor dependencies
    fn supports_vendoring(&self) -> bool {
        false
    }

    /// Build a file fetcher
    fn file_fetcher(&self, args: FetcherArgs) -> Box<dyn FileFetcher>;

    /// Build a file parser
    fn file_parser(&self, args: ParserArgs) -> Box<dyn FileParser>;

    /// Build an update checker, loading whatever it needs up front
    async fn update_checker(&self, args: CheckerArgs) -> Result<Box<dyn UpdateChecker>, AppError>;

    /// Build a file updater
    fn file_updater(&self, args: UpdaterArgs) -> Box<dyn FileUpdater>;
}

/// Package managers with a built-in ecosystem
pub const SUPPORTED_PACKAGE_MANAGERS: &[&str] = &["cargo"];

/// Look up the ecosystem for a package manager name
pub fn for_package_manager(name: &str) -> Result<Arc<dyn Ecosystem>, AppError> {
    match name.trim().to_lowercase().as_str() {
        "cargo" => Ok(Arc::new(CargoEcosystem::new()?)),
        _ => Err(ConfigError::UnknownPackageManager {
            name: name.to_string(),
        }
        .into()),
    }
}
