//! Core domain models for bumpbot
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency records and the files they come from
//! - The repository source and the credentials to reach it
//! - Security advisories and ignore conditions
//! - Unlock scopes and decisions
//! - Per-dependency results and the run summary

mod advisory;
mod credential;
mod dependency;
mod dependency_file;
mod source;
mod summary;
mod unlock;
mod update_result;

pub use advisory::{advisories_for, IgnoreCondition, SecurityAdvisory};
pub use credential::{git_token_for, Credential};
pub use dependency::{Dependency, Requirement};
pub use dependency_file::{find_file, DependencyFile};
pub use source::{normalize_directory, Provider, Source};
pub use summary::{PullRequest, RunOutcome, RunSummary};
pub use unlock::{RequirementsUpdateStrategy, UnlockDecision, UnlockScope};
pub use update_result::{ConflictingDependency, SkipReason, UpdateResult};
