//! Cargo version requirement handling
//!
//! Handles requirement formats:
//! - Caret (default): `1.2.3` or `^1.2.3`
//! - Tilde: `~1.2.3`
//! - Exact pinned: `=1.2.3`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Wildcard: `*`, `1.*`
//! - Range: `>=1.0, <2.0`
//!
//! and rewrites them for a new version according to a
//! `RequirementsUpdateStrategy`.

use crate::domain::RequirementsUpdateStrategy;
use crate::update::{parse_version, parse_version_req};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

const VERSION: &str = r"(\d+(?:\.\d+){0,2}(?:-[\w.]+)?(?:\+[\w.]+)?)";

static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(=|\^|~|>=|>|<=|<)?\s*{}$", VERSION)).unwrap());
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(>=|>)\s*{}\s*,\s*(<=|<)\s*{}$",
        VERSION, VERSION
    ))
    .unwrap()
});
static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*$|^\d+(?:\.\d+)?\.\*$").unwrap());

/// The kind of a Cargo version requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    /// `1.2.3` or `^1.2.3`
    Caret,
    /// `~1.2.3`
    Tilde,
    /// `=1.2.3`
    Exact,
    /// `>=1.2.3`
    GreaterOrEqual,
    /// `>1.2.3`
    Greater,
    /// `<=1.2.3`
    LessOrEqual,
    /// `<1.2.3`
    Less,
    /// `*` or `1.*`
    Wildcard,
    /// `>=1.0, <2.0`
    Range,
}

/// A parsed Cargo requirement that remembers how it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoRequirement {
    /// The kind of requirement
    pub kind: RequirementKind,
    /// The requirement as written in the manifest
    pub raw: String,
    /// The version number inside the requirement (lower bound for ranges)
    pub version: String,
    /// Operator written before the version (`^`, `~`, `=`, ...), if any
    pub prefix: Option<String>,
}

impl CargoRequirement {
    /// Parse a requirement string
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if WILDCARD_RE.is_match(trimmed) {
            return Some(Self {
                kind: RequirementKind::Wildcard,
                raw: trimmed.to_string(),
                version: trimmed.to_string(),
                prefix: None,
            });
        }

        if let Some(caps) = RANGE_RE.captures(trimmed) {
            return Some(Self {
                kind: RequirementKind::Range,
                raw: trimmed.to_string(),
                version: caps[2].to_string(),
                prefix: Some(caps[1].to_string()),
            });
        }

        let caps = OPERATOR_RE.captures(trimmed)?;
        let prefix = caps.get(1).map(|m| m.as_str().to_string());
        let kind = match prefix.as_deref() {
            None | Some("^") => RequirementKind::Caret,
            Some("~") => RequirementKind::Tilde,
            Some("=") => RequirementKind::Exact,
            Some(">=") => RequirementKind::GreaterOrEqual,
            Some(">") => RequirementKind::Greater,
            Some("<=") => RequirementKind::LessOrEqual,
            Some("<") => RequirementKind::Less,
            Some(_) => return None,
        };

        Some(Self {
            kind,
            raw: trimmed.to_string(),
            version: caps[2].to_string(),
            prefix,
        })
    }

    /// Returns true if the requirement admits exactly one version
    pub fn is_pinned(&self) -> bool {
        self.kind == RequirementKind::Exact
    }

    /// Returns true if `version` satisfies the requirement
    pub fn matches(&self, version: &Version) -> bool {
        parse_version_req(&self.raw)
            .map(|req| req.matches(version))
            .unwrap_or(false)
    }

    /// Formats `new_version` in the style of this requirement, keeping the
    /// operator and the number of version components (`1.0` stays two
    /// components, so 1.2.3 becomes `1.2`)
    pub fn format_updated(&self, new_version: &Version) -> String {
        let precision = self.version.split(['-', '+']).next().unwrap_or("").split('.').count();
        let formatted = if !new_version.pre.is_empty() || precision >= 3 {
            new_version.to_string()
        } else if precision == 2 {
            format!("{}.{}", new_version.major, new_version.minor)
        } else {
            new_version.major.to_string()
        };
        format!("{}{}", self.prefix.as_deref().unwrap_or(""), formatted)
    }

    /// Extends the requirement so it admits `new_version`, keeping its lower
    /// bound where possible
    pub fn widened(&self, new_version: &Version) -> String {
        if self.matches(new_version) {
            return self.raw.clone();
        }
        match self.kind {
            RequirementKind::Range | RequirementKind::Less | RequirementKind::LessOrEqual => {
                let upper = format!("<{}", new_version.major + 1);
                match self.kind {
                    RequirementKind::Range => {
                        let lower = self.raw.split(',').next().unwrap_or("").trim();
                        format!("{}, {}", lower, upper)
                    }
                    _ => upper,
                }
            }
            RequirementKind::Caret | RequirementKind::Tilde => {
                let lower = parse_version(&self.version)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| self.version.clone());
                format!(">={}, <{}", lower, new_version.major + 1)
            }
            _ => self.format_updated(new_version),
        }
    }

    /// Returns the rewritten requirement for `new_version`, or `None` when
    /// the strategy leaves it unchanged
    pub fn updated_for(
        &self,
        new_version: &Version,
        strategy: RequirementsUpdateStrategy,
    ) -> Option<String> {
        let satisfied = self.matches(new_version);
        let updated = match (strategy, self.kind) {
            (RequirementsUpdateStrategy::LockfileOnly, _) => return None,
            (_, RequirementKind::Wildcard) => return None,
            (_, RequirementKind::Greater | RequirementKind::GreaterOrEqual) if satisfied => {
                return None
            }
            (
                RequirementsUpdateStrategy::BumpVersions,
                RequirementKind::Range | RequirementKind::Less | RequirementKind::LessOrEqual,
            ) => self.widened(new_version),
            (RequirementsUpdateStrategy::BumpVersions, _) => self.format_updated(new_version),
            (_, _) if satisfied => return None,
            (RequirementsUpdateStrategy::WidenRanges, _) => self.widened(new_version),
            (
                RequirementsUpdateStrategy::BumpVersionsIfNecessary,
                RequirementKind::Range | RequirementKind::Less | RequirementKind::LessOrEqual,
            ) => self.widened(new_version),
            (RequirementsUpdateStrategy::BumpVersionsIfNecessary, _) => {
                self.format_updated(new_version)
            }
        };

        if updated == self.raw {
            None
        } else {
            Some(updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> CargoRequirement {
        CargoRequirement::parse(raw).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_bare_version_is_caret() {
        let req = parse("1.2.3");
        assert_eq!(req.kind, RequirementKind::Caret);
        assert_eq!(req.version, "1.2.3");
        assert_eq!(req.prefix, None);
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(parse("^1.2").kind, RequirementKind::Caret);
        assert_eq!(parse("~1.9").kind, RequirementKind::Tilde);
        assert_eq!(parse("=1.0.0").kind, RequirementKind::Exact);
        assert!(parse("=1.0.0").is_pinned());
        assert_eq!(parse(">=1.0").kind, RequirementKind::GreaterOrEqual);
        assert_eq!(parse(">1.0").kind, RequirementKind::Greater);
        assert_eq!(parse("<=2.0").kind, RequirementKind::LessOrEqual);
        assert_eq!(parse("<2").kind, RequirementKind::Less);
        assert_eq!(parse("1.0.0-alpha.1").version, "1.0.0-alpha.1");
    }

    #[test]
    fn test_parse_range_and_wildcard() {
        let range = parse(">=1.0, <2.0");
        assert_eq!(range.kind, RequirementKind::Range);
        assert_eq!(range.version, "1.0");
        assert_eq!(parse("*").kind, RequirementKind::Wildcard);
        assert_eq!(parse("1.*").kind, RequirementKind::Wildcard);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(CargoRequirement::parse("").is_none());
        assert!(CargoRequirement::parse(">>1.0").is_none());
        assert!(CargoRequirement::parse("latest").is_none());
    }

    #[test]
    fn test_matches() {
        assert!(parse("1.0").matches(&v("1.9.0")));
        assert!(!parse("1.0").matches(&v("2.0.0")));
        assert!(!parse("=1.0.0").matches(&v("1.0.1")));
        assert!(parse(">=1.0, <2.0").matches(&v("1.5.0")));
    }

    #[test]
    fn test_format_updated_keeps_precision() {
        assert_eq!(parse("1.0").format_updated(&v("1.2.3")), "1.2");
        assert_eq!(parse("^1.0.100").format_updated(&v("1.2.3")), "^1.2.3");
        assert_eq!(parse("=0.5.1").format_updated(&v("0.6.0")), "=0.6.0");
        assert_eq!(parse("1").format_updated(&v("2.1.0")), "2");
    }

    #[test]
    fn test_widened() {
        assert_eq!(parse(">=1.0, <2.0").widened(&v("2.3.0")), ">=1.0, <3");
        assert_eq!(parse("1.0").widened(&v("2.3.0")), ">=1.0.0, <3");
        assert_eq!(parse("1.0").widened(&v("1.3.0")), "1.0");
    }

    #[test]
    fn test_updated_for_bump_versions() {
        let strategy = RequirementsUpdateStrategy::BumpVersions;
        assert_eq!(
            parse("1.0.0").updated_for(&v("1.2.0"), strategy).as_deref(),
            Some("1.2.0")
        );
        assert_eq!(parse("1.2.0").updated_for(&v("1.2.0"), strategy), None);
        assert_eq!(parse("*").updated_for(&v("9.0.0"), strategy), None);
        assert_eq!(parse("<2").updated_for(&v("1.5.0"), strategy), None);
        assert_eq!(
            parse("<2").updated_for(&v("2.1.0"), strategy).as_deref(),
            Some("<3")
        );
    }

    #[test]
    fn test_updated_for_if_necessary() {
        let strategy = RequirementsUpdateStrategy::BumpVersionsIfNecessary;
        assert_eq!(parse("1.0").updated_for(&v("1.2.0"), strategy), None);
        assert_eq!(
            parse("1.0").updated_for(&v("2.0.0"), strategy).as_deref(),
            Some("2.0")
        );
        assert_eq!(
            parse("=1.0.0").updated_for(&v("1.0.1"), strategy).as_deref(),
            Some("=1.0.1")
        );
    }

    #[test]
    fn test_updated_for_widen_and_lockfile_only() {
        assert_eq!(
            parse("~1.2")
                .updated_for(&v("1.3.0"), RequirementsUpdateStrategy::WidenRanges)
                .as_deref(),
            Some(">=1.2.0, <2")
        );
        assert_eq!(
            parse("=1.0.0").updated_for(&v("2.0.0"), RequirementsUpdateStrategy::LockfileOnly),
            None
        );
    }
}
