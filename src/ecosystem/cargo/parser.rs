//! Cargo.toml / Cargo.lock parser
//!
//! Handles:
//! - dependencies, dev-dependencies and build-dependencies
//! - target-specific dependency tables
//! - workspace.dependencies
//! - Inline table format: { version = "1.0" }
//! - Renamed dependencies: { package = "real-name" }
//! - Resolved versions and transitive dependencies from Cargo.lock

use super::{CARGO_LOCK, CARGO_TOML};
use crate::domain::{find_file, Dependency, DependencyFile, Requirement};
use crate::ecosystem::{FileParser, ParserArgs};
use crate::error::{AppError, ManifestError};
use crate::update::parse_version;
use serde::Deserialize;
use std::path::PathBuf;
use toml::Value;

/// Dependency table names and the group recorded for them
const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Parser for Cargo dependency files
pub struct CargoParser {
    args: ParserArgs,
}

impl CargoParser {
    /// Create a new parser
    pub fn new(args: ParserArgs) -> Self {
        Self { args }
    }
}

/// One declaration found in Cargo.toml
#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    name: String,
    requirement: Option<String>,
    group: String,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Clone, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    source: Option<String>,
}

impl LockedPackage {
    fn is_registry(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| s.starts_with("registry+") || s.starts_with("sparse+"))
    }
}

fn parse_toml(file: &DependencyFile) -> Result<Value, ManifestError> {
    file.content
        .parse::<Value>()
        .map_err(|e| ManifestError::toml_parse_error(file.repo_path(), e.message()))
}

/// Collect every declaration from a parsed Cargo.toml
fn declarations(toml: &Value) -> Vec<Declaration> {
    let mut found = Vec::new();

    for table in DEPENDENCY_TABLES {
        if let Some(deps) = toml.get(table).and_then(|d| d.as_table()) {
            collect_table(deps, table, &mut found);
        }
    }

    if let Some(targets) = toml.get("target").and_then(|t| t.as_table()) {
        for target_config in targets.values() {
            for table in DEPENDENCY_TABLES {
                if let Some(deps) = target_config.get(table).and_then(|d| d.as_table()) {
                    collect_table(deps, table, &mut found);
                }
            }
        }
    }

    if let Some(deps) = toml
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        collect_table(deps, "workspace.dependencies", &mut found);
    }

    found
}

fn collect_table(deps: &toml::map::Map<String, Value>, group: &str, output: &mut Vec<Declaration>) {
    for (key, value) in deps {
        let declaration = match value {
            // Simple string: package = "1.0.0"
            Value::String(s) => Declaration {
                name: key.clone(),
                requirement: Some(s.clone()),
                group: group.to_string(),
                source: None,
            },
            Value::Table(t) => {
                // Path and workspace-inherited dependencies are not updatable
                if t.contains_key("path") || t.contains_key("workspace") {
                    continue;
                }
                let name = t
                    .get("package")
                    .and_then(|p| p.as_str())
                    .unwrap_or(key)
                    .to_string();
                Declaration {
                    name,
                    requirement: t.get("version").and_then(|v| v.as_str()).map(String::from),
                    group: group.to_string(),
                    source: t.get("git").and_then(|g| g.as_str()).map(String::from),
                }
            }
            _ => continue,
        };
        output.push(declaration);
    }
}

/// Pick the locked version for a top-level dependency
fn locked_version(locked: &[LockedPackage], name: &str, requirements: &[Requirement]) -> Option<String> {
    let candidates: Vec<&LockedPackage> = locked.iter().filter(|p| p.name == name).collect();
    if candidates.len() <= 1 {
        return candidates.first().map(|p| p.version.clone());
    }

    // Several versions are locked: prefer the one the manifest asks for
    candidates
        .iter()
        .find(|p| {
            let Some(version) = parse_version(&p.version) else {
                return false;
            };
            requirements.iter().all(|r| {
                r.requirement
                    .as_deref()
                    .and_then(super::requirement::CargoRequirement::parse)
                    .map(|req| req.matches(&version))
                    .unwrap_or(true)
            })
        })
        .or(candidates.last())
        .map(|p| p.version.clone())
}

impl FileParser for CargoParser {
    fn parse(&self) -> Result<Vec<Dependency>, AppError> {
        let files = &self.args.dependency_files;
        let manifest = find_file(files, CARGO_TOML)
            .ok_or_else(|| ManifestError::not_found(PathBuf::from(CARGO_TOML)))?;
        let toml = parse_toml(manifest)?;

        let mut dependencies: Vec<Dependency> = Vec::new();
        for declaration in declarations(&toml) {
            if let Some(source) = &declaration.source {
                if self.args.reject_external_code {
                    return Err(ManifestError::ExternalCodeRejected {
                        name: declaration.name,
                        source_url: source.clone(),
                    }
                    .into());
                }
            }

            let requirement = Requirement {
                file: CARGO_TOML.to_string(),
                requirement: declaration.requirement,
                groups: vec![declaration.group],
                source: declaration.source,
            };

            match dependencies.iter_mut().find(|d| d.name == declaration.name) {
                Some(existing) => {
                    let same = existing.requirements.iter_mut().find(|r| {
                        r.requirement == requirement.requirement && r.source == requirement.source
                    });
                    match same {
                        Some(r) => {
                            for group in requirement.groups {
                                if !r.groups.contains(&group) {
                                    r.groups.push(group);
                                }
                            }
                        }
                        None => existing.requirements.push(requirement),
                    }
                }
                None => dependencies.push(
                    Dependency::new(declaration.name, None, super::PACKAGE_MANAGER)
                        .with_requirement(requirement),
                ),
            }
        }

        let Some(lockfile) = find_file(files, CARGO_LOCK) else {
            log::debug!("no {} found, versions are unknown", CARGO_LOCK);
            return Ok(dependencies);
        };
        let locked: Lockfile = toml::from_str(&lockfile.content)
            .map_err(|e| ManifestError::toml_parse_error(lockfile.repo_path(), e.message()))?;
        let registry_packages: Vec<LockedPackage> = locked
            .package
            .into_iter()
            .filter(LockedPackage::is_registry)
            .collect();

        for dependency in &mut dependencies {
            dependency.version =
                locked_version(&registry_packages, &dependency.name, &dependency.requirements);
        }

        for package in &registry_packages {
            if dependencies.iter().any(|d| d.name == package.name) {
                continue;
            }
            dependencies.push(Dependency::new(
                package.name.clone(),
                Some(package.version.clone()),
                super::PACKAGE_MANAGER,
            ));
        }

        Ok(dependencies)
    }
}
