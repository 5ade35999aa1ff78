//! Update checker for Cargo dependencies
//!
//! Versions come from the crates.io registry. Resolution is approximated
//! from the manifest alone: a top-level dependency is constrained by its own
//! requirements, a transitive one by semver compatibility with the locked
//! version.

use super::requirement::CargoRequirement;
use super::{CARGO_LOCK, CARGO_TOML};
use crate::domain::{
    find_file, ConflictingDependency, Dependency, DependencyFile, IgnoreCondition, Requirement,
    RequirementsUpdateStrategy, SecurityAdvisory, UnlockScope,
};
use crate::ecosystem::{CheckerArgs, UpdateChecker};
use crate::error::{AppError, CheckError, RegistryError};
use crate::registry::RegistryAdapter;
use crate::update::{parse_version, VersionInfo};
use semver::Version;

/// Checker for a single Cargo dependency
#[derive(Debug)]
pub struct CargoChecker {
    dependency: Dependency,
    current: Option<Version>,
    /// Published versions that may be moved to, ascending
    candidates: Vec<Version>,
    advisories: Vec<SecurityAdvisory>,
    strategy: RequirementsUpdateStrategy,
    /// Name of the package declaring the dependency
    owner: String,
    owner_version: Option<String>,
}

/// Strategy used when none is configured
fn default_strategy(files: &[DependencyFile]) -> RequirementsUpdateStrategy {
    if find_file(files, CARGO_LOCK).is_some() {
        RequirementsUpdateStrategy::BumpVersions
    } else {
        RequirementsUpdateStrategy::BumpVersionsIfNecessary
    }
}

/// Package name and version from the `[package]` table
fn manifest_package(files: &[DependencyFile]) -> (String, Option<String>) {
    let package = find_file(files, CARGO_TOML)
        .and_then(|f| f.content.parse::<toml::Value>().ok())
        .and_then(|toml| toml.get("package").cloned());
    let field = |key: &str| {
        package
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };
    (
        field("name").unwrap_or_else(|| CARGO_TOML.to_string()),
        field("version"),
    )
}

fn candidate_versions(
    dependency: &Dependency,
    current: Option<&Version>,
    published: &[VersionInfo],
    ignore_conditions: &[IgnoreCondition],
) -> Vec<Version> {
    let allow_prerelease = current.is_some_and(|v| !v.pre.is_empty());
    let mut candidates: Vec<Version> = published
        .iter()
        .filter(|info| allow_prerelease || !info.is_prerelease())
        .filter(|info| {
            !ignore_conditions
                .iter()
                .any(|c| c.ignores(&dependency.name, &info.version))
        })
        .filter_map(|info| parse_version(&info.version))
        .collect();
    candidates.sort();
    candidates.dedup();
    candidates
}

impl CargoChecker {
    /// Build a checker from already fetched versions
    pub fn new(args: CheckerArgs, published: &[VersionInfo]) -> Self {
        let current = args.dependency.version.as_deref().and_then(parse_version);
        let candidates = candidate_versions(
            &args.dependency,
            current.as_ref(),
            published,
            &args.ignore_conditions,
        );
        let strategy = args
            .requirements_update_strategy
            .unwrap_or_else(|| default_strategy(&args.dependency_files));
        let (owner, owner_version) = manifest_package(&args.dependency_files);

        Self {
            dependency: args.dependency,
            current,
            candidates,
            advisories: args.security_advisories,
            strategy,
            owner,
            owner_version,
        }
    }

    /// Build a checker, fetching versions from the registry
    pub async fn load(
        args: CheckerArgs,
        registry: &dyn RegistryAdapter,
    ) -> Result<Self, AppError> {
        if args.dependency.has_external_source() {
            log::debug!("{} is not from a registry, no versions to check", args.dependency.name);
            return Ok(Self::new(args, &[]));
        }

        let published = match registry.fetch_versions(&args.dependency.name).await {
            Ok(versions) => versions,
            Err(RegistryError::PackageNotFound { package, registry }) => {
                log::warn!("{} not found in {}", package, registry);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(args, &published))
    }

    fn is_vulnerable_version(&self, version: &Version) -> bool {
        let version = version.to_string();
        self.advisories.iter().any(|a| a.is_vulnerable(&version))
    }

    fn parsed_requirements(&self) -> Vec<CargoRequirement> {
        self.dependency
            .requirements
            .iter()
            .filter_map(|r| r.requirement.as_deref())
            .filter_map(CargoRequirement::parse)
            .collect()
    }

    /// Returns true if `version` is allowed without changing any requirement
    fn satisfies_constraints(&self, version: &Version) -> bool {
        if self.dependency.is_top_level() {
            return self.parsed_requirements().iter().all(|r| r.matches(version));
        }
        match &self.current {
            Some(current) => CargoRequirement::parse(&format!("^{}", current))
                .map(|r| r.matches(version))
                .unwrap_or(false),
            None => false,
        }
    }

    fn is_newer(&self, version: &Version) -> bool {
        self.current.as_ref().map_or(true, |current| version > current)
    }

    fn latest(&self) -> Option<&Version> {
        self.candidates.last()
    }

    fn lowest_fix(&self, constrained: bool) -> Option<&Version> {
        self.candidates.iter().find(|v| {
            self.is_newer(v)
                && !self.is_vulnerable_version(v)
                && (!constrained || self.satisfies_constraints(v))
        })
    }

    fn latest_resolvable(&self) -> Option<&Version> {
        if self.requirements_unlocked_or_can_be() {
            return self.latest();
        }
        self.candidates
            .iter()
            .rev()
            .find(|v| self.satisfies_constraints(v))
    }

    /// Version an update moves to, within what the constraints can allow
    fn target(&self) -> Option<&Version> {
        if self.vulnerable() {
            self.lowest_fix(!self.requirements_unlocked_or_can_be())
        } else {
            self.latest_resolvable()
        }
    }

    /// Version the dependency would move to if nothing constrained it
    fn preferred(&self) -> Option<&Version> {
        if self.vulnerable() {
            self.lowest_fix(false)
        } else {
            self.latest()
        }
    }

    fn requirements_for(&self, target: &Version, scope: UnlockScope) -> Vec<Requirement> {
        if scope == UnlockScope::None {
            return self.dependency.requirements.clone();
        }
        self.dependency
            .requirements
            .iter()
            .map(|r| {
                r.requirement
                    .as_deref()
                    .and_then(CargoRequirement::parse)
                    .and_then(|req| req.updated_for(target, self.strategy))
                    .map(|updated| r.with_requirement(updated))
                    .unwrap_or_else(|| r.clone())
            })
            .collect()
    }
}

impl UpdateChecker for CargoChecker {
    fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    fn vulnerable(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|v| self.is_vulnerable_version(v))
    }

    fn version_known(&self) -> bool {
        self.current.is_some()
    }

    fn latest_version(&self) -> Option<String> {
        self.latest().map(Version::to_string)
    }

    fn lowest_security_fix_version(&self) -> Option<String> {
        self.lowest_fix(false).map(Version::to_string)
    }

    fn up_to_date(&self) -> bool {
        let Some(latest) = self.latest() else {
            return true;
        };
        match &self.current {
            Some(current) => latest <= current,
            // Without a lockfile the manifest already admitting the latest
            // version is as current as it gets
            None => self.satisfies_constraints(latest) || !self.dependency.is_top_level(),
        }
    }

    fn latest_resolvable_version(&self) -> Option<String> {
        self.latest_resolvable().map(Version::to_string)
    }

    fn lowest_resolvable_security_fix_version(&self) -> Option<String> {
        self.lowest_fix(!self.requirements_unlocked_or_can_be())
            .map(Version::to_string)
    }

    fn requirements_unlocked_or_can_be(&self) -> bool {
        self.strategy.unlocks_requirements()
            && self.dependency.is_top_level()
            && !self.dependency.has_external_source()
    }

    fn can_update(&self, scope: UnlockScope) -> Result<bool, AppError> {
        let Some(target) = self.target() else {
            return Ok(false);
        };
        if !self.is_newer(target) {
            return Ok(false);
        }
        Ok(match scope {
            UnlockScope::None => self.version_known() && self.satisfies_constraints(target),
            UnlockScope::Own | UnlockScope::All => self.requirements_unlocked_or_can_be(),
        })
    }

    fn conflicting_dependencies(&self) -> Vec<ConflictingDependency> {
        let Some(preferred) = self.preferred() else {
            return Vec::new();
        };
        self.dependency
            .requirements
            .iter()
            .filter_map(|r| {
                let raw = r.requirement.as_deref()?;
                let parsed = CargoRequirement::parse(raw)?;
                if parsed.matches(preferred) {
                    return None;
                }
                Some(ConflictingDependency {
                    name: self.owner.clone(),
                    version: self.owner_version.clone(),
                    requirement: Some(raw.to_string()),
                    explanation: format!(
                        "{} requires {} {}",
                        self.owner, self.dependency.name, raw
                    ),
                })
            })
            .collect()
    }

    fn updated_dependencies(&self, scope: UnlockScope) -> Result<Vec<Dependency>, AppError> {
        let target = self.target().ok_or_else(|| CheckError::NoTargetVersion {
            dependency: self.dependency.name.clone(),
        })?;
        let requirements = self.requirements_for(target, scope);
        Ok(vec![self
            .dependency
            .updated_to(target.to_string(), requirements)])
    }

    fn requirements_update_strategy(&self) -> Option<RequirementsUpdateStrategy> {
        Some(self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    const MANIFEST: &str = "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\nserde = \"1.0\"\n";

    fn serde(version: Option<&str>, requirement: &str) -> Dependency {
        Dependency::new("serde", version.map(String::from), "cargo")
            .with_requirement(Requirement::new(CARGO_TOML, requirement, "dependencies"))
    }

    fn args(dependency: Dependency) -> CheckerArgs {
        CheckerArgs {
            dependency,
            dependency_files: vec![
                DependencyFile::new(CARGO_TOML, "/", MANIFEST),
                DependencyFile::new(CARGO_LOCK, "/", "version = 3\n"),
            ],
            credentials: Vec::new(),
            repo_contents_path: PathBuf::from("/tmp/owner/repo"),
            requirements_update_strategy: None,
            options: Default::default(),
            security_advisories: Vec::new(),
            ignore_conditions: Vec::new(),
        }
    }

    fn published(versions: &[&str]) -> Vec<VersionInfo> {
        versions.iter().map(|v| VersionInfo::now(*v)).collect()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_latest_and_up_to_date() {
        let checker = CargoChecker::new(
            args(serde(Some("1.0.100"), "1.0")),
            &published(&["1.0.100", "1.2.0", "2.0.0-beta.1"]),
        );
        assert_eq!(checker.latest_version().as_deref(), Some("1.2.0"));
        assert!(!checker.up_to_date());
        assert!(checker.version_known());
        assert!(!checker.vulnerable());

        let current = CargoChecker::new(
            args(serde(Some("1.2.0"), "1.0")),
            &published(&["1.0.100", "1.2.0"]),
        );
        assert!(current.up_to_date());
    }

    #[test]
    fn test_prerelease_current_allows_prereleases() {
        let checker = CargoChecker::new(
            args(serde(Some("2.0.0-alpha.1"), "2.0.0-alpha.1")),
            &published(&["1.0.0", "2.0.0-alpha.1", "2.0.0-beta.1"]),
        );
        assert_eq!(checker.latest_version().as_deref(), Some("2.0.0-beta.1"));
    }

    #[test]
    fn test_ignore_conditions_filter_versions() {
        let mut a = args(serde(Some("1.0.100"), "1.0"));
        a.ignore_conditions = vec!["serde:>= 1.2.0".parse().unwrap()];
        let checker = CargoChecker::new(a, &published(&["1.0.100", "1.1.0", "1.2.0"]));
        assert_eq!(checker.latest_version().as_deref(), Some("1.1.0"));
    }

    #[test]
    fn test_own_update_bumps_requirement() {
        let checker = CargoChecker::new(
            args(serde(Some("1.0.100"), "1.0.100")),
            &published(&["1.0.100", "1.2.0"]),
        );
        assert_eq!(
            checker.requirements_update_strategy(),
            Some(RequirementsUpdateStrategy::BumpVersions)
        );
        assert!(checker.requirements_unlocked_or_can_be());
        assert!(checker.can_update(UnlockScope::Own).unwrap());

        let updated = checker.updated_dependencies(UnlockScope::Own).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].version.as_deref(), Some("1.2.0"));
        assert_eq!(updated[0].previous_version.as_deref(), Some("1.0.100"));
        assert_eq!(updated[0].requirements[0].requirement.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_none_scope_keeps_requirements() {
        let checker = CargoChecker::new(
            args(serde(Some("1.0.100"), "1.0")),
            &published(&["1.0.100", "1.2.0"]),
        );
        assert!(checker.can_update(UnlockScope::None).unwrap());
        let updated = checker.updated_dependencies(UnlockScope::None).unwrap();
        assert_eq!(updated[0].requirements[0].requirement.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_lockfile_only_stays_within_requirement() {
        let mut a = args(serde(Some("1.0.100"), "1.0"));
        a.requirements_update_strategy = Some(RequirementsUpdateStrategy::LockfileOnly);
        let checker = CargoChecker::new(a, &published(&["1.0.100", "1.5.0", "2.0.0"]));
        assert!(!checker.requirements_unlocked_or_can_be());
        assert_eq!(checker.latest_resolvable_version().as_deref(), Some("1.5.0"));
        assert!(checker.can_update(UnlockScope::None).unwrap());
        assert!(!checker.can_update(UnlockScope::Own).unwrap());

        let conflicts = checker.conflicting_dependencies();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].name, "app");
        assert_eq!(conflicts[0].explanation, "app requires serde 1.0");
    }

    #[test]
    fn test_pinned_lockfile_only_not_updatable() {
        let mut a = args(serde(Some("1.0.100"), "=1.0.100"));
        a.requirements_update_strategy = Some(RequirementsUpdateStrategy::LockfileOnly);
        let checker = CargoChecker::new(a, &published(&["1.0.100", "1.2.0"]));
        assert!(!checker.can_update(UnlockScope::None).unwrap());
        assert!(!checker.can_update(UnlockScope::Own).unwrap());
        assert!(!checker.can_update(UnlockScope::All).unwrap());
    }

    #[test]
    fn test_vulnerable_targets_lowest_fix() {
        let mut a = args(serde(Some("1.0.0"), "1.0"));
        a.security_advisories = vec![SecurityAdvisory {
            dependency_name: "serde".to_string(),
            affected_versions: vec!["< 1.0.5".to_string()],
            patched_versions: vec![">= 1.0.5".to_string()],
            unaffected_versions: Vec::new(),
        }];
        let checker = CargoChecker::new(a, &published(&["1.0.0", "1.0.3", "1.0.5", "1.1.0"]));
        assert!(checker.vulnerable());
        assert_eq!(checker.lowest_security_fix_version().as_deref(), Some("1.0.5"));
        assert_eq!(
            checker.lowest_resolvable_security_fix_version().as_deref(),
            Some("1.0.5")
        );
        let updated = checker.updated_dependencies(UnlockScope::Own).unwrap();
        assert_eq!(updated[0].version.as_deref(), Some("1.0.5"));
    }

    #[test]
    fn test_unknown_version_without_lockfile() {
        let mut a = args(serde(None, "1.0"));
        a.dependency_files = vec![DependencyFile::new(CARGO_TOML, "/", MANIFEST)];
        let checker = CargoChecker::new(a, &published(&["1.0.0", "1.9.0"]));
        assert!(!checker.version_known());
        assert!(!checker.vulnerable());
        assert!(checker.up_to_date());
        assert_eq!(
            checker.requirements_update_strategy(),
            Some(RequirementsUpdateStrategy::BumpVersionsIfNecessary)
        );

        let mut a = args(serde(None, "1.0"));
        a.dependency_files = vec![DependencyFile::new(CARGO_TOML, "/", MANIFEST)];
        let checker = CargoChecker::new(a, &published(&["1.0.0", "2.1.0"]));
        assert!(!checker.up_to_date());
        assert!(!checker.can_update(UnlockScope::None).unwrap());
        assert!(checker.can_update(UnlockScope::Own).unwrap());
        let updated = checker.updated_dependencies(UnlockScope::Own).unwrap();
        assert_eq!(updated[0].requirements[0].requirement.as_deref(), Some("2.1"));
    }

    #[test]
    fn test_transitive_stays_semver_compatible() {
        let dependency = Dependency::new("itoa", Some("1.0.9".to_string()), "cargo");
        let checker = CargoChecker::new(args(dependency), &published(&["1.0.9", "1.0.11", "2.0.0"]));
        assert!(!checker.requirements_unlocked_or_can_be());
        assert_eq!(checker.latest_resolvable_version().as_deref(), Some("1.0.11"));
        assert!(checker.can_update(UnlockScope::None).unwrap());
        assert!(checker.satisfies_constraints(&v("1.0.11")));
        assert!(!checker.satisfies_constraints(&v("2.0.0")));
    }

    #[test]
    fn test_no_versions_no_target() {
        let checker = CargoChecker::new(args(serde(Some("1.0.0"), "1.0")), &[]);
        assert!(checker.up_to_date());
        assert!(!checker.can_update(UnlockScope::Own).unwrap());
        assert!(matches!(
            checker.updated_dependencies(UnlockScope::Own),
            Err(AppError::Check(CheckError::NoTargetVersion { .. }))
        ));
    }

    struct StaticRegistry {
        result: fn() -> Result<Vec<VersionInfo>, RegistryError>,
    }

    #[async_trait]
    impl RegistryAdapter for StaticRegistry {
        fn registry_name(&self) -> &'static str {
            "static"
        }

        async fn fetch_versions(&self, _package: &str) -> Result<Vec<VersionInfo>, RegistryError> {
            (self.result)()
        }
    }

    #[tokio::test]
    async fn test_load_from_registry() {
        let registry = StaticRegistry {
            result: || Ok(vec![VersionInfo::now("1.0.100"), VersionInfo::now("1.3.0")]),
        };
        let checker = CargoChecker::load(args(serde(Some("1.0.100"), "1.0")), &registry)
            .await
            .unwrap();
        assert_eq!(checker.latest_version().as_deref(), Some("1.3.0"));
    }

    #[tokio::test]
    async fn test_load_package_not_found_has_no_versions() {
        let registry = StaticRegistry {
            result: || Err(RegistryError::package_not_found("serde", "static")),
        };
        let checker = CargoChecker::load(args(serde(Some("1.0.100"), "1.0")), &registry)
            .await
            .unwrap();
        assert!(checker.latest_version().is_none());
    }

    #[tokio::test]
    async fn test_load_network_error_propagates() {
        let registry = StaticRegistry {
            result: || Err(RegistryError::network_error("serde", "static", "connection reset")),
        };
        let result = CargoChecker::load(args(serde(Some("1.0.100"), "1.0")), &registry).await;
        assert!(matches!(result, Err(AppError::Registry(_))));
    }
}
