//! Cargo ecosystem: `Cargo.toml` / `Cargo.lock` against crates.io

mod checker;
mod fetcher;
mod parser;
mod requirement;
mod updater;

pub use checker::CargoChecker;
pub use fetcher::CargoFetcher;
pub use parser::CargoParser;
pub use requirement::{CargoRequirement, RequirementKind};
pub use updater::CargoUpdater;

use crate::ecosystem::{
    CheckerArgs, Ecosystem, FetcherArgs, FileFetcher, FileParser, FileUpdater, ParserArgs,
    UpdateChecker, UpdaterArgs,
};
use crate::error::AppError;
use crate::registry::{CratesIoAdapter, HttpClient, RegistryAdapter};
use async_trait::async_trait;
use std::sync::Arc;

/// Package manager name
pub const PACKAGE_MANAGER: &str = "cargo";
/// Manifest file name
pub const CARGO_TOML: &str = "Cargo.toml";
/// Lockfile name
pub const CARGO_LOCK: &str = "Cargo.lock";

/// Cargo collaborators backed by a registry adapter
pub struct CargoEcosystem {
    registry: Arc<dyn RegistryAdapter>,
}

impl CargoEcosystem {
    /// Create an ecosystem talking to crates.io
    pub fn new() -> Result<Self, AppError> {
        let client = HttpClient::new()?;
        Ok(Self::with_registry(Arc::new(CratesIoAdapter::new(client))))
    }

    /// Create an ecosystem with a custom registry adapter
    pub fn with_registry(registry: Arc<dyn RegistryAdapter>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Ecosystem for CargoEcosystem {
    fn package_manager(&self) -> &'static str {
        PACKAGE_MANAGER
    }

    fn language_label(&self) -> &'static str {
        "rust"
    }

    fn file_fetcher(&self, args: FetcherArgs) -> Box<dyn FileFetcher> {
        Box::new(CargoFetcher::new(args))
    }

    fn file_parser(&self, args: ParserArgs) -> Box<dyn FileParser> {
        Box::new(CargoParser::new(args))
    }

    async fn update_checker(&self, args: CheckerArgs) -> Result<Box<dyn UpdateChecker>, AppError> {
        let checker = CargoChecker::load(args, self.registry.as_ref()).await?;
        Ok(Box::new(checker))
    }

    fn file_updater(&self, args: UpdaterArgs) -> Box<dyn FileUpdater> {
        Box::new(CargoUpdater::new(args))
    }
}
