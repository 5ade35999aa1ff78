//! Credentials handed to collaborators

use std::fmt;

/// A credential for a git host or registry
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Credential type (e.g. `git_source`)
    pub kind: String,
    /// Host the credential applies to
    pub host: String,
    /// Username, if the host needs one
    pub username: Option<String>,
    /// Secret value
    pub password: String,
}

impl Credential {
    /// Creates a `git_source` credential from an access token
    pub fn git_source(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            kind: "git_source".to_string(),
            host: host.into(),
            username: Some("x-access-token".to_string()),
            password: token.into(),
        }
    }

    /// Returns true if this is a git source credential for `host`
    pub fn is_git_source_for(&self, host: &str) -> bool {
        self.kind == "git_source" && self.host == host
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Finds the git source token for `host`
pub fn git_token_for<'a>(credentials: &'a [Credential], host: &str) -> Option<&'a str> {
    credentials
        .iter()
        .find(|c| c.is_git_source_for(host))
        .map(|c| c.password.as_str())
}
