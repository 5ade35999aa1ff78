//! Dependency information structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single declaration of a dependency inside one dependency file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// File the requirement was declared in (e.g. `Cargo.toml`)
    pub file: String,
    /// The version requirement string, if the declaration has one
    pub requirement: Option<String>,
    /// Dependency groups (e.g. `dependencies`, `dev-dependencies`)
    pub groups: Vec<String>,
    /// Non-registry source (git URL or path), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Requirement {
    /// Creates a registry requirement in a single group
    pub fn new(
        file: impl Into<String>,
        requirement: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            requirement: Some(requirement.into()),
            groups: vec![group.into()],
            source: None,
        }
    }

    /// Sets the non-registry source (builder pattern)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Replaces the requirement string, keeping file, groups and source
    pub fn with_requirement(&self, requirement: impl Into<String>) -> Self {
        Self {
            requirement: Some(requirement.into()),
            ..self.clone()
        }
    }
}

/// A package dependency as produced by a parser or an update checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Currently resolved version; `None` when no lockfile pins it
    pub version: Option<String>,
    /// Version before an update (set on updated dependencies only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    /// Declarations of this dependency; empty for transitive dependencies
    pub requirements: Vec<Requirement>,
    /// Declarations before an update (set on updated dependencies only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_requirements: Option<Vec<Requirement>>,
    /// Package manager that owns this dependency (e.g. `cargo`)
    pub package_manager: String,
}

impl Dependency {
    /// Creates a new dependency with no requirements
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        package_manager: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            previous_version: None,
            requirements: Vec::new(),
            previous_requirements: None,
            package_manager: package_manager.into(),
        }
    }

    /// Adds a requirement (builder pattern)
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Returns true if the dependency is declared directly by the project
    pub fn is_top_level(&self) -> bool {
        !self.requirements.is_empty()
    }

    /// Returns the current version, or an empty string when unknown
    pub fn display_version(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    /// Returns the previous version, or an empty string when unknown
    pub fn display_previous_version(&self) -> &str {
        self.previous_version.as_deref().unwrap_or("")
    }

    /// Returns a copy moved to `version` with `requirements`, recording the
    /// current state as the previous one
    pub fn updated_to(&self, version: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        Self {
            name: self.name.clone(),
            version: Some(version.into()),
            previous_version: self.version.clone(),
            requirements,
            previous_requirements: Some(self.requirements.clone()),
            package_manager: self.package_manager.clone(),
        }
    }

    /// Returns true if any requirement pulls this dependency from a
    /// non-registry source
    pub fn has_external_source(&self) -> bool {
        self.requirements.iter().any(|r| r.source.is_some())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
