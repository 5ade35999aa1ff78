//! Application error types using thiserror
//!
//! Error hierarchy:
//! - FetchError: Issues locating the repository or its dependency files
//! - ManifestError: Issues with dependency file parsing and updating
//! - RegistryError: Issues with package registry communication
//! - CheckError: Issues raised by an update checker
//! - ConfigError: Issues with CLI / environment configuration
//! - GitError: Failures of the local git executable
//! - PullRequestError: Failures talking to the git forge
//! - IoError: File system operation failures
//!
//! Only `FetchError` values are *classified*: a run that hits one of them
//! ends cleanly with nothing to update. Everything else propagates.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Repository / dependency file fetch errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Dependency file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Update checker errors
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local git errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Pull request creation errors
    #[error(transparent)]
    PullRequest(#[from] PullRequestError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised while locating the repository and its dependency files
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Repository does not exist or the credentials cannot see it
    #[error("repository not found: {repo}")]
    RepositoryNotFound { repo: String },

    /// Requested branch does not exist
    #[error("branch not found: {branch}")]
    BranchNotFound { branch: String },

    /// Requested directory does not exist in the repository
    #[error("directory not found: {directory}")]
    DirectoryNotFound { directory: String },

    /// A required dependency file is missing from the directory
    #[error("dependency file {file} not found in {directory}")]
    DependencyFileNotFound { file: String, directory: String },

    /// The git remote could not be reached at all
    #[error("git remote {url} is unreachable: {message}")]
    RemoteUnreachable { url: String, message: String },
}

/// Structured classification of a recognized fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchErrorDetails {
    /// Stable machine-readable error type (e.g. `repo_not_found`)
    pub error_type: String,
    /// Human-readable detail for the error type
    pub error_detail: String,
}

impl fmt::Display for FetchErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.error_type, self.error_detail)
    }
}

/// Errors related to dependency file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Dependency file not found in the fetched set
    #[error("dependency file not found: {path}")]
    NotFound { path: PathBuf },

    /// TOML parsing error (for Cargo.toml, Cargo.lock)
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// Invalid version requirement
    #[error("invalid version requirement '{spec}' in {path}: {message}")]
    InvalidVersionSpec {
        path: PathBuf,
        spec: String,
        message: String,
    },

    /// Parser refused a dependency that would pull external code
    #[error("refusing to parse {name}: it is fetched from external source {source_url}")]
    ExternalCodeRejected { name: String, source_url: String },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors raised by an update checker
#[derive(Error, Debug)]
pub enum CheckError {
    /// An update was requested but the checker has no version to move to
    #[error("no target version available for {dependency}")]
    NoTargetVersion { dependency: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Repository name missing
    #[error("no repository given: pass --repo or set BUMPBOT_REPO")]
    MissingRepository,

    /// Repository name not in `owner/name` form
    #[error("invalid repository '{value}': expected 'owner/name'")]
    InvalidRepository { value: String },

    /// Directory that climbs out of the repository
    #[error("invalid directory '{value}': '..' components are not allowed")]
    InvalidDirectory { value: String },

    /// Unknown hosting provider
    #[error("{message}")]
    InvalidProvider { message: String },

    /// Unknown package manager
    #[error("unknown package manager '{name}'")]
    UnknownPackageManager { name: String },

    /// Unknown requirements update strategy
    #[error(
        "invalid requirements update strategy '{value}': expected 'bump_versions', \
         'bump_versions_if_necessary', 'widen_ranges' or 'lockfile_only'"
    )]
    InvalidStrategy { value: String },

    /// Ignore condition not in `name[:requirement]` form
    #[error("invalid ignore condition '{value}': {message}")]
    InvalidIgnoreCondition { value: String, message: String },

    /// Updater option not in `key=value` form
    #[error("invalid updater option '{value}': expected key=value")]
    InvalidOption { value: String },

    /// Cache step name not recognized
    #[error("invalid cache step '{value}': expected 'files'")]
    InvalidCacheStep { value: String },

    /// Security advisory file could not be loaded
    #[error("failed to load security advisories from {path}: {message}")]
    Advisories { path: PathBuf, message: String },

    /// Option not supported by the selected ecosystem
    #[error("{option} is not supported for {package_manager}")]
    UnsupportedOption {
        option: String,
        package_manager: String,
    },
}

/// Errors from the local git executable
#[derive(Error, Debug)]
pub enum GitError {
    /// Git ran but reported failure
    #[error("git {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Git could not be started
    #[error("failed to execute git: {source}")]
    Exec {
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to pull request creation
#[derive(Error, Debug)]
pub enum PullRequestError {
    /// The forge API answered with an error status
    #[error("{provider} API request to {endpoint} failed with HTTP {status}: {message}")]
    Api {
        provider: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The request never reached the forge
    #[error("failed to reach {provider}: {message}")]
    Network { provider: String, message: String },

    /// The forge answered with a body of the wrong shape
    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// The update branch already exists
    #[error("branch {branch} already exists")]
    BranchAlreadyExists { branch: String },

    /// No credential for the forge host
    #[error("no credentials configured for {host}")]
    MissingCredentials { host: String },

    /// No base commit to branch from
    #[error("no base commit available to branch from")]
    MissingBaseCommit,

    /// Provider not supported
    #[error("pull requests are not supported for provider {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Permission denied
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Classifies a failure raised while fetching dependency files.
    ///
    /// Returns `None` for failures that must propagate unchanged.
    pub fn fetcher_error_details(&self) -> Option<FetchErrorDetails> {
        match self {
            AppError::Fetch(err) => Some(err.details()),
            _ => None,
        }
    }
}

impl FetchError {
    /// Maps this error to its `(error-type, error-detail)` pair
    pub fn details(&self) -> FetchErrorDetails {
        let (error_type, error_detail) = match self {
            FetchError::RepositoryNotFound { repo } => ("repo_not_found", repo.clone()),
            FetchError::BranchNotFound { branch } => ("branch_not_found", branch.clone()),
            FetchError::DirectoryNotFound { directory } => {
                ("directory_not_found", directory.clone())
            }
            FetchError::DependencyFileNotFound { file, directory } => (
                "dependency_file_not_found",
                format!("{}/{}", directory.trim_end_matches('/'), file),
            ),
            FetchError::RemoteUnreachable { url, .. } => ("git_remote_unreachable", url.clone()),
        };
        FetchErrorDetails {
            error_type: error_type.to_string(),
            error_detail,
        }
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidVersionSpec error
    pub fn invalid_version_spec(
        path: impl Into<PathBuf>,
        spec: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ManifestError::InvalidVersionSpec {
            path: path.into(),
            spec: spec.into(),
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }
}

impl GitError {
    /// Creates a new CommandFailed error
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        GitError::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl IoError {
    /// Creates a new Generic IO error, mapping permission failures
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return IoError::PermissionDenied { path };
        }
        IoError::Generic { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_is_classified() {
        let err: AppError = FetchError::RepositoryNotFound {
            repo: "owner/missing".to_string(),
        }
        .into();
        let details = err.fetcher_error_details().unwrap();
        assert_eq!(details.error_type, "repo_not_found");
        assert_eq!(details.error_detail, "owner/missing");
    }

    #[test]
    fn test_dependency_file_not_found_detail() {
        let details = FetchError::DependencyFileNotFound {
            file: "Cargo.toml".to_string(),
            directory: "/crates/core/".to_string(),
        }
        .details();
        assert_eq!(details.error_type, "dependency_file_not_found");
        assert_eq!(details.error_detail, "/crates/core/Cargo.toml");
    }

    #[test]
    fn test_other_errors_are_not_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = IoError::generic("/tmp/x", io).into();
        assert!(err.fetcher_error_details().is_none());

        let err: AppError = GitError::command_failed("checkout", "bad revision").into();
        assert!(err.fetcher_error_details().is_none());
    }

    #[test]
    fn test_fetch_error_details_display() {
        let details = FetchError::BranchNotFound {
            branch: "release".to_string(),
        }
        .details();
        assert_eq!(details.to_string(), "branch_not_found release");
    }

    #[test]
    fn test_manifest_error_toml_parse() {
        let err = ManifestError::toml_parse_error("/path/to/Cargo.toml", "invalid key");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse TOML"));
        assert!(msg.contains("invalid key"));
    }

    #[test]
    fn test_manifest_error_invalid_version_spec() {
        let err = ManifestError::invalid_version_spec("Cargo.toml", ">>1.0", "invalid operator");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid version requirement"));
        assert!(msg.contains(">>1.0"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent-crate", "crates.io");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent-crate' not found"));
        assert!(msg.contains("crates.io"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("serde", "crates.io");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("serde"));
    }

    #[test]
    fn test_config_error_unsupported_option() {
        let err = ConfigError::UnsupportedOption {
            option: "--vendor".to_string(),
            package_manager: "cargo".to_string(),
        };
        assert_eq!(err.to_string(), "--vendor is not supported for cargo");
    }

    #[test]
    fn test_io_error_generic_maps_permission_denied() {
        let source = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = IoError::generic("/protected", source);
        assert!(matches!(err, IoError::PermissionDenied { .. }));
    }

    #[test]
    fn test_app_error_from_pull_request_error() {
        let err: AppError = PullRequestError::BranchAlreadyExists {
            branch: "bumpbot/cargo/serde-1.0.1".to_string(),
        }
        .into();
        assert!(err.to_string().contains("already exists"));
    }
}
