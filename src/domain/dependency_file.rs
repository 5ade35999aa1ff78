//! Dependency file contents as fetched from (and written back to) a repository

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A dependency file and its contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// File name relative to `directory` (e.g. `Cargo.toml`)
    pub name: String,
    /// Repository directory the file lives in, always starting with `/`
    pub directory: String,
    /// File contents
    pub content: String,
}

impl DependencyFile {
    /// Creates a new dependency file
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            content: content.into(),
        }
    }

    /// Path of the file relative to the repository root, without a leading `/`
    pub fn repo_path(&self) -> String {
        let dir = self.directory.trim_matches('/');
        if dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", dir, self.name)
        }
    }

    /// Absolute path of this file inside a local clone
    pub fn path_in(&self, repo_contents_path: &Path) -> PathBuf {
        repo_contents_path.join(self.repo_path())
    }

    /// Returns a copy with new contents
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }
}

/// Finds a file by name in a fetched set
pub fn find_file<'a>(files: &'a [DependencyFile], name: &str) -> Option<&'a DependencyFile> {
    files.iter().find(|f| f.name == name)
}
