//! Registry adapters for fetching package version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - crates.io API adapter used by the cargo update checker

mod client;
mod crates_io;

pub use client::{HttpClient, DEFAULT_USER_AGENT};
pub use crates_io::CratesIoAdapter;

use crate::error::RegistryError;
use crate::update::VersionInfo;
use async_trait::async_trait;

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch available versions for a package, sorted ascending
    async fn fetch_versions(&self, package: &str) -> Result<Vec<VersionInfo>, RegistryError>;
}
