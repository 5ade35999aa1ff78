//! Fetches Cargo dependency files from a local clone

use super::{CARGO_LOCK, CARGO_TOML};
use crate::domain::{git_token_for, DependencyFile};
use crate::ecosystem::{FetcherArgs, FileFetcher};
use crate::error::{AppError, FetchError, IoError};
use crate::git::CloneRequest;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Fetcher for `Cargo.toml` and `Cargo.lock`
pub struct CargoFetcher {
    args: FetcherArgs,
}

impl CargoFetcher {
    /// Create a new fetcher
    pub fn new(args: FetcherArgs) -> Self {
        Self { args }
    }

    fn directory_path(&self) -> PathBuf {
        let relative = self.args.source.directory.trim_start_matches('/');
        self.args.repo_contents_path.join(relative)
    }

    /// Reads one file, returning `None` when it does not exist
    async fn read_optional(&self, name: &str) -> Result<Option<DependencyFile>, AppError> {
        let path = self.directory_path().join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(DependencyFile::new(
                name,
                self.args.source.directory.clone(),
                content,
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IoError::generic(path, e).into()),
        }
    }
}

#[async_trait]
impl FileFetcher for CargoFetcher {
    async fn clone_repo_contents(&self) -> Result<(), AppError> {
        let source = &self.args.source;
        let url = source.url();
        let request = CloneRequest {
            repo: &source.repo,
            url: &url,
            branch: source.branch.as_deref(),
            token: git_token_for(&self.args.credentials, source.hostname()),
        };
        self.args
            .git
            .clone_repo(&request, &self.args.repo_contents_path)
    }

    async fn commit(&self) -> Result<String, AppError> {
        self.args.git.head_commit(&self.args.repo_contents_path)
    }

    async fn files(&self) -> Result<Vec<DependencyFile>, AppError> {
        let directory = self.directory_path();
        if !directory.is_dir() {
            return Err(FetchError::DirectoryNotFound {
                directory: self.args.source.directory.clone(),
            }
            .into());
        }

        let manifest = self.read_optional(CARGO_TOML).await?.ok_or_else(|| {
            FetchError::DependencyFileNotFound {
                file: CARGO_TOML.to_string(),
                directory: self.args.source.directory.clone(),
            }
        })?;

        let mut files = vec![manifest];
        if let Some(lockfile) = self.read_optional(CARGO_LOCK).await? {
            files.push(lockfile);
        }
        log::debug!(
            "fetched {} from {}",
            files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", "),
            self.args.source.directory
        );
        Ok(files)
    }
}
