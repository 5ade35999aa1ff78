//! bumpbot - dependency update driver library
//!
//! This library provides one update run over a repository directory:
//! - Fetching and parsing dependency files through an ecosystem
//! - Deciding, per dependency, whether and how far to unlock requirements
//! - Rewriting dependency files and opening a pull request
//!
//! Cargo (`Cargo.toml` / `Cargo.lock` against crates.io) is the built-in
//! ecosystem.

pub mod cli;
pub mod config;
pub mod domain;
pub mod ecosystem;
pub mod error;
pub mod forge;
pub mod git;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod update;
