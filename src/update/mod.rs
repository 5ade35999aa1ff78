//! Update decision logic for dependencies
//!
//! This module provides:
//! - The dependency filter applied before checking
//! - Version info from registries and lenient version parsing
//! - The per-dependency update decision

pub mod decision;
mod filter;
mod version_info;

pub use decision::{decide, unlock_decision, CheckPosition};
pub use filter::DependencyFilter;
pub use version_info::{
    compare_versions, is_prerelease_version, parse_version, parse_version_req, VersionInfo,
};
