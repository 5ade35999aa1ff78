//! Repository source descriptor and forge provider

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Git hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// github.com
    #[default]
    Github,
    /// gitlab.com
    Gitlab,
    /// bitbucket.org
    Bitbucket,
}

impl Provider {
    /// Returns the default hostname for this provider
    pub fn hostname(&self) -> &'static str {
        match self {
            Provider::Github => "github.com",
            Provider::Gitlab => "gitlab.com",
            Provider::Bitbucket => "bitbucket.org",
        }
    }

    /// Returns the lowercase name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Gitlab => "gitlab",
            Provider::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Provider::Github),
            "gitlab" => Ok(Provider::Gitlab),
            "bitbucket" => Ok(Provider::Bitbucket),
            other => Err(format!(
                "unknown provider '{}': expected 'github', 'gitlab' or 'bitbucket'",
                other
            )),
        }
    }
}

/// Identifies the repository, directory, branch and commit a run works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Hosting provider
    pub provider: Provider,
    /// Repository in `owner/name` form
    pub repo: String,
    /// Directory inside the repository, always starting with `/`
    pub directory: String,
    /// Branch to operate against (`None` means the default branch)
    pub branch: Option<String>,
    /// Commit to operate against (`None` means the branch head)
    pub commit: Option<String>,
}

impl Source {
    /// Creates a source for the root directory of the default branch
    pub fn new(provider: Provider, repo: impl Into<String>) -> Self {
        Self {
            provider,
            repo: repo.into(),
            directory: "/".to_string(),
            branch: None,
            commit: None,
        }
    }

    /// Sets the directory (builder pattern)
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = normalize_directory(&directory.into());
        self
    }

    /// Sets the branch (builder pattern)
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Sets the commit (builder pattern)
    pub fn with_commit(mut self, commit: Option<String>) -> Self {
        self.commit = commit;
        self
    }

    /// Returns the provider hostname
    pub fn hostname(&self) -> &'static str {
        self.provider.hostname()
    }

    /// Returns the HTTPS clone URL of the repository
    pub fn url(&self) -> String {
        format!("https://{}/{}", self.hostname(), self.repo)
    }

    /// Returns true if the source targets the repository root
    pub fn is_root_directory(&self) -> bool {
        self.directory == "/"
    }
}

/// Normalizes a directory to start with `/` and drop trailing slashes
pub fn normalize_directory(directory: &str) -> String {
    let trimmed = directory.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}
