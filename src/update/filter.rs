//! Dependency filter
//!
//! This module provides the DependencyFilter struct that decides which
//! parsed dependencies a run checks.

use crate::domain::Dependency;

/// Filter applied to parsed dependencies before they are checked
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    /// Explicit dependency names (lower-cased); `None` means top-level only
    names: Option<Vec<String>>,
}

impl DependencyFilter {
    /// Create a filter that keeps only top-level dependencies
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the filter to an explicit list of names
    ///
    /// Names are compared case-insensitively. Transitive dependencies are
    /// kept when named.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names.into_iter().map(|n| n.to_lowercase()).collect());
        self
    }

    /// Create a filter from an optional list of names
    pub fn from_names(names: Option<Vec<String>>) -> Self {
        match names {
            Some(names) => Self::new().with_names(names),
            None => Self::new(),
        }
    }

    /// Returns the explicit names, if any
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Check if a dependency should be checked
    pub fn matches(&self, dependency: &Dependency) -> bool {
        match &self.names {
            None => dependency.is_top_level(),
            Some(names) => {
                let name = dependency.name.to_lowercase();
                names.iter().any(|n| *n == name)
            }
        }
    }

    /// Apply the filter, keeping parser order
    pub fn apply(&self, dependencies: Vec<Dependency>) -> Vec<Dependency> {
        dependencies.into_iter().filter(|d| self.matches(d)).collect()
    }
}
