//! Version information and version helpers
//!
//! This module provides the VersionInfo struct that represents a published
//! package version with its release date, plus lenient parsing helpers on top
//! of `semver` used by checkers and advisories.

use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Information about a package version from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// The version string (e.g., "1.2.3")
    pub version: String,
    /// When this version was released
    pub released_at: DateTime<Utc>,
}

impl VersionInfo {
    /// Create a new VersionInfo
    pub fn new(version: impl Into<String>, released_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            released_at,
        }
    }

    /// Create a VersionInfo with current time as release date
    pub fn now(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            released_at: Utc::now(),
        }
    }

    /// Returns true if this is a pre-release version
    pub fn is_prerelease(&self) -> bool {
        is_prerelease_version(&self.version)
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
    }
}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parses a version leniently: strips a leading `v` and pads missing
/// minor/patch components (`1.2` → `1.2.0`)
pub fn parse_version(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }

    let (core, rest) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), rest)).ok()
}

/// Parses a version requirement, tolerating whitespace between an operator
/// and its version (`>= 1.2.3, < 2`)
pub fn parse_version_req(s: &str) -> Option<VersionReq> {
    let normalized = s
        .split(',')
        .map(|part| part.split_whitespace().collect::<String>())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if normalized.is_empty() {
        return None;
    }
    VersionReq::parse(&normalized).ok()
}

/// Returns true if the version carries a pre-release tag
pub fn is_prerelease_version(version: &str) -> bool {
    match parse_version(version) {
        Some(v) => !v.pre.is_empty(),
        None => {
            let lower = version.to_ascii_lowercase();
            ["alpha", "beta", "rc", "pre", "dev", "canary", "nightly"]
                .iter()
                .any(|tag| lower.contains(tag))
        }
    }
}

/// Compare two version strings using semver rules, falling back to a
/// numeric component comparison for versions semver cannot read
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Some(va), Some(vb)) = (parse_version(a), parse_version(b)) {
        return va.cmp(&vb);
    }

    let parse_parts = |s: &str| -> Vec<u64> {
        let s = s.strip_prefix('v').unwrap_or(s);
        s.split(['.', '-']).filter_map(|p| p.parse().ok()).collect()
    };

    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    parts_a.len().cmp(&parts_b.len())
}
