//! Per-dependency update decision result types

use super::{Dependency, UnlockScope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Another dependency whose requirements block an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingDependency {
    /// Name of the blocking dependency
    pub name: String,
    /// Its resolved version, when known
    pub version: Option<String>,
    /// The requirement that blocks the update
    pub requirement: Option<String>,
    /// Human-readable explanation of the conflict
    pub explanation: String,
}

/// Reason why a dependency was not updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Security-only run and the dependency is not vulnerable
    NotVulnerable {
        /// False when no lockfile pins the installed version
        version_known: bool,
    },
    /// Already at the latest version
    UpToDate,
    /// No unlock scope allows an update
    UpdateNotPossible {
        /// True when the missed update was security-relevant
        security: bool,
        /// Dependencies that block the update
        conflicts: Vec<ConflictingDependency>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotVulnerable {
                version_known: true,
            } => write!(f, "no security update needed"),
            SkipReason::NotVulnerable {
                version_known: false,
            } => write!(f, "installed version unknown"),
            SkipReason::UpToDate => write!(f, "already up-to-date"),
            SkipReason::UpdateNotPossible { security: true, .. } => {
                write!(f, "no security update possible")
            }
            SkipReason::UpdateNotPossible { security: false, .. } => {
                write!(f, "no update possible")
            }
        }
    }
}

/// Result of the update decision for a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateResult {
    /// The dependency will be updated
    Update {
        /// The dependency as parsed
        dependency: Dependency,
        /// Version the update moves to
        target_version: Option<String>,
        /// Unlock scope the checker agreed to
        scope: UnlockScope,
        /// Every dependency record the update changes
        updated: Vec<Dependency>,
    },
    /// The dependency was left alone
    Skip {
        /// The dependency as parsed
        dependency: Dependency,
        /// Why it was skipped
        reason: SkipReason,
    },
}

impl UpdateResult {
    /// Creates a Skip result
    pub fn skip(dependency: Dependency, reason: SkipReason) -> Self {
        UpdateResult::Skip { dependency, reason }
    }

    /// Returns true if this is an update result
    pub fn is_update(&self) -> bool {
        matches!(self, UpdateResult::Update { .. })
    }

    /// Returns true if this is a skip result
    pub fn is_skip(&self) -> bool {
        matches!(self, UpdateResult::Skip { .. })
    }

    /// Returns the dependency reference
    pub fn dependency(&self) -> &Dependency {
        match self {
            UpdateResult::Update { dependency, .. } => dependency,
            UpdateResult::Skip { dependency, .. } => dependency,
        }
    }

    /// Returns the records this result adds to the update collection
    pub fn updated_dependencies(&self) -> &[Dependency] {
        match self {
            UpdateResult::Update { updated, .. } => updated,
            UpdateResult::Skip { .. } => &[],
        }
    }

    /// Returns the skip reason, if skipped
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            UpdateResult::Skip { reason, .. } => Some(reason),
            UpdateResult::Update { .. } => None,
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Update {
                dependency,
                target_version,
                scope,
                ..
            } => write!(
                f,
                "{}: {} → {} (unlock {})",
                dependency.name,
                dependency.display_version(),
                target_version.as_deref().unwrap_or("?"),
                scope
            ),
            UpdateResult::Skip { dependency, reason } => {
                write!(f, "{}: skipped ({})", dependency.name, reason)
            }
        }
    }
}
