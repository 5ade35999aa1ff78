//! Security advisories and ignore conditions fed to update checkers

use crate::update::{parse_version, parse_version_req};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A known vulnerability affecting a range of versions of one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAdvisory {
    /// Affected dependency name
    pub dependency_name: String,
    /// Requirements matching vulnerable versions (e.g. `< 1.2.3`)
    #[serde(default)]
    pub affected_versions: Vec<String>,
    /// Requirements matching versions with the fix
    #[serde(default)]
    pub patched_versions: Vec<String>,
    /// Requirements matching versions never affected
    #[serde(default)]
    pub unaffected_versions: Vec<String>,
}

impl SecurityAdvisory {
    /// Returns true if the advisory is about `name` (case-insensitive)
    pub fn applies_to(&self, name: &str) -> bool {
        self.dependency_name.eq_ignore_ascii_case(name)
    }

    /// Returns true if `version` is vulnerable according to this advisory.
    ///
    /// Unparseable versions are never reported as vulnerable.
    pub fn is_vulnerable(&self, version: &str) -> bool {
        let Some(version) = parse_version(version) else {
            return false;
        };

        let matches_any = |reqs: &[String]| {
            reqs.iter()
                .filter_map(|r| parse_version_req(r))
                .any(|req| req.matches(&version))
        };

        if matches_any(&self.patched_versions) || matches_any(&self.unaffected_versions) {
            return false;
        }

        if self.affected_versions.is_empty() {
            // Without an explicit range everything not patched is affected
            return !self.patched_versions.is_empty();
        }

        matches_any(&self.affected_versions)
    }
}

/// Versions of a dependency the run must never move to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreCondition {
    /// Dependency name (case-insensitive)
    pub dependency_name: String,
    /// Requirement matching ignored versions; `None` ignores every version
    pub version_requirement: Option<String>,
}

impl IgnoreCondition {
    /// Returns true if `version` of `name` is ignored
    pub fn ignores(&self, name: &str, version: &str) -> bool {
        if !self.dependency_name.eq_ignore_ascii_case(name) {
            return false;
        }
        let Some(requirement) = &self.version_requirement else {
            return true;
        };
        match (parse_version_req(requirement), parse_version(version)) {
            (Some(req), Some(version)) => req.matches(&version),
            _ => false,
        }
    }
}

impl FromStr for IgnoreCondition {
    type Err = String;

    /// Parses `name` or `name:requirement`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, requirement) = match s.split_once(':') {
            Some((name, req)) => (name.trim(), Some(req.trim())),
            None => (s.trim(), None),
        };

        if name.is_empty() {
            return Err("missing dependency name".to_string());
        }

        if let Some(req) = requirement {
            if parse_version_req(req).is_none() {
                return Err(format!("'{}' is not a version requirement", req));
            }
        }

        Ok(Self {
            dependency_name: name.to_string(),
            version_requirement: requirement.map(String::from),
        })
    }
}

/// Returns the advisories that apply to `name`
pub fn advisories_for<'a>(
    advisories: &'a [SecurityAdvisory],
    name: &str,
) -> Vec<&'a SecurityAdvisory> {
    advisories.iter().filter(|a| a.applies_to(name)).collect()
}
