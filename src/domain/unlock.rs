//! Unlock scopes, unlock decisions and requirement update strategies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much of the requirement graph an update may change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockScope {
    /// Only the resolved version changes; no requirement is touched
    None,
    /// The dependency's own requirement may change
    Own,
    /// Every affected requirement may change
    All,
}

impl UnlockScope {
    /// Probe order used when requirements can be unlocked
    pub const UNLOCKING_ORDER: [UnlockScope; 2] = [UnlockScope::Own, UnlockScope::All];

    /// Returns the snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockScope::None => "none",
            UnlockScope::Own => "own",
            UnlockScope::All => "all",
        }
    }
}

impl fmt::Display for UnlockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of probing a checker for an unlock scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockDecision {
    /// An update is possible within the given scope
    Unlock(UnlockScope),
    /// No scope permits an update
    UpdateNotPossible,
}

impl UnlockDecision {
    /// Returns the scope when an update is possible
    pub fn scope(&self) -> Option<UnlockScope> {
        match self {
            UnlockDecision::Unlock(scope) => Some(*scope),
            UnlockDecision::UpdateNotPossible => None,
        }
    }
}

impl fmt::Display for UnlockDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockDecision::Unlock(scope) => write!(f, "{}", scope),
            UnlockDecision::UpdateNotPossible => write!(f, "update_not_possible"),
        }
    }
}

/// How requirement strings are rewritten when a dependency is bumped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementsUpdateStrategy {
    /// Always rewrite the requirement to the new version
    BumpVersions,
    /// Rewrite only when the new version falls outside the requirement
    BumpVersionsIfNecessary,
    /// Extend the requirement's upper bound to admit the new version
    WidenRanges,
    /// Never rewrite requirements; only the lockfile moves
    LockfileOnly,
}

impl RequirementsUpdateStrategy {
    /// Returns the snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementsUpdateStrategy::BumpVersions => "bump_versions",
            RequirementsUpdateStrategy::BumpVersionsIfNecessary => "bump_versions_if_necessary",
            RequirementsUpdateStrategy::WidenRanges => "widen_ranges",
            RequirementsUpdateStrategy::LockfileOnly => "lockfile_only",
        }
    }

    /// Returns true if requirements may be rewritten at all
    pub fn unlocks_requirements(&self) -> bool {
        !matches!(self, RequirementsUpdateStrategy::LockfileOnly)
    }
}

impl fmt::Display for RequirementsUpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequirementsUpdateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "bump_versions" => Ok(RequirementsUpdateStrategy::BumpVersions),
            "bump_versions_if_necessary" => Ok(RequirementsUpdateStrategy::BumpVersionsIfNecessary),
            "widen_ranges" => Ok(RequirementsUpdateStrategy::WidenRanges),
            "lockfile_only" => Ok(RequirementsUpdateStrategy::LockfileOnly),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocking_order() {
        assert_eq!(
            UnlockScope::UNLOCKING_ORDER,
            [UnlockScope::Own, UnlockScope::All]
        );
    }

    #[test]
    fn test_unlock_decision_display() {
        assert_eq!(UnlockDecision::Unlock(UnlockScope::Own).to_string(), "own");
        assert_eq!(
            UnlockDecision::UpdateNotPossible.to_string(),
            "update_not_possible"
        );
    }

    #[test]
    fn test_unlock_decision_scope() {
        assert_eq!(
            UnlockDecision::Unlock(UnlockScope::None).scope(),
            Some(UnlockScope::None)
        );
        assert_eq!(UnlockDecision::UpdateNotPossible.scope(), None);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "bump-versions-if-necessary"
                .parse::<RequirementsUpdateStrategy>()
                .unwrap(),
            RequirementsUpdateStrategy::BumpVersionsIfNecessary
        );
        assert_eq!(
            "lockfile_only".parse::<RequirementsUpdateStrategy>().unwrap(),
            RequirementsUpdateStrategy::LockfileOnly
        );
        assert!("yolo".parse::<RequirementsUpdateStrategy>().is_err());
    }

    #[test]
    fn test_lockfile_only_does_not_unlock() {
        assert!(!RequirementsUpdateStrategy::LockfileOnly.unlocks_requirements());
        assert!(RequirementsUpdateStrategy::WidenRanges.unlocks_requirements());
    }
}
