//! Update orchestrator for coordinating one update run
//!
//! This module provides:
//! - Workflow coordination: fetch → parse → filter → decide → update → write → submit
//! - Clone cache handling and commit pinning
//! - Recovery from classified fetch failures
//!
//! Dependencies are checked one at a time; every collaborator call is awaited
//! before the next one starts.

use crate::config::{CacheStep, RunConfig};
use crate::domain::{
    advisories_for, Dependency, DependencyFile, RunOutcome, RunSummary, Source, UpdateResult,
};
use crate::ecosystem::{
    CheckerArgs, Ecosystem, FetcherArgs, FileFetcher, ParserArgs, UpdaterArgs,
};
use crate::error::{AppError, FetchErrorDetails, IoError};
use crate::forge::{PullRequestCreator, PullRequestRequest};
use crate::git::GitRunner;
use crate::output::{Reporter, RunEvent};
use crate::progress::Progress;
use crate::update::{decide, CheckPosition, DependencyFilter};
use std::path::PathBuf;
use std::sync::Arc;

/// Result of fetching dependency files
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The files were read from the clone
    Files(Vec<DependencyFile>),
    /// A recognized failure ended the fetch
    Handled(FetchErrorDetails),
}

/// State of one run, passed into each stage
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run configuration
    pub config: RunConfig,
    /// Source derived from the configuration
    pub source: Source,
    /// Fetched dependency files
    pub files: Vec<DependencyFile>,
    /// Commit the files were read at
    pub commit: Option<String>,
    /// The accumulated update collection
    pub updated_dependencies: Vec<Dependency>,
}

impl RunContext {
    /// Create the context for a run that has not fetched anything yet
    pub fn new(config: RunConfig) -> Self {
        let source = config.source();
        Self {
            config,
            source,
            files: Vec::new(),
            commit: None,
            updated_dependencies: Vec::new(),
        }
    }
}

/// Orchestrator for coordinating the update workflow
pub struct Orchestrator {
    ecosystem: Arc<dyn Ecosystem>,
    git: Arc<dyn GitRunner>,
    pr_creator: Option<Box<dyn PullRequestCreator>>,
    reporter: Box<dyn Reporter>,
    progress: Progress,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        ecosystem: Arc<dyn Ecosystem>,
        git: Arc<dyn GitRunner>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            ecosystem,
            git,
            pr_creator: None,
            reporter,
            progress: Progress::disabled(),
        }
    }

    /// Set the pull request creator (builder pattern)
    pub fn with_pull_request_creator(mut self, creator: Box<dyn PullRequestCreator>) -> Self {
        self.pr_creator = Some(creator);
        self
    }

    /// Set the progress display (builder pattern)
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    fn report(&self, event: RunEvent<'_>) {
        self.reporter.report(&event);
    }

    /// Run the whole workflow for one repository directory
    pub async fn run(&self, config: RunConfig) -> Result<RunSummary, AppError> {
        config.validate_for(self.ecosystem.as_ref())?;

        let mut ctx = RunContext::new(config);
        let mut summary = RunSummary::new(
            ctx.config.repo.clone(),
            ctx.source.directory.clone(),
            self.ecosystem.package_manager(),
        );

        self.report(RunEvent::Fetching {
            package_manager: self.ecosystem.package_manager(),
            repo: &ctx.config.repo,
        });
        let fetcher = self.ecosystem.file_fetcher(self.fetcher_args(&ctx));
        let files = match self.fetch_files(&ctx, fetcher.as_ref()).await? {
            FetchOutcome::Files(files) => files,
            FetchOutcome::Handled(details) => {
                summary.finish(RunOutcome::FetchErrorHandled(details));
                return Ok(summary);
            }
        };
        ctx.commit = Some(fetcher.commit().await?);
        ctx.files = files;
        summary.original_files = ctx.files.clone();

        if ctx.files.is_empty() {
            log::info!("no dependency files fetched");
            summary.finish(RunOutcome::NoDependencyFiles);
            return Ok(summary);
        }

        let dependencies = self.parse(&ctx)?;
        let names: Vec<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();
        self.report(RunEvent::UpdatingDependencies { names });

        let total = dependencies.len();
        for (i, dependency) in dependencies.iter().enumerate() {
            let position = CheckPosition {
                index: i + 1,
                total,
            };
            let result = self.check(&ctx, dependency, position).await?;
            ctx.updated_dependencies
                .extend(result.updated_dependencies().iter().cloned());
            summary.results.push(result);
        }
        summary.updated_dependencies = ctx.updated_dependencies.clone();

        if ctx.updated_dependencies.is_empty() {
            self.report(RunEvent::Done);
            summary.finish(RunOutcome::NothingToUpdate);
            return Ok(summary);
        }

        for dependency in &ctx.updated_dependencies {
            self.report(RunEvent::Updating {
                name: &dependency.name,
                previous_version: dependency.previous_version.as_deref(),
                version: dependency.version.as_deref(),
            });
        }

        let updater = self.ecosystem.file_updater(UpdaterArgs {
            dependencies: ctx.updated_dependencies.clone(),
            dependency_files: ctx.files.clone(),
            credentials: ctx.config.credentials.clone(),
            options: ctx.config.options.clone(),
        });
        let updated_files = updater.updated_dependency_files()?;

        if ctx.config.write {
            summary.written_files = self.write_files(&ctx, &updated_files).await?;
        }
        summary.updated_files = updated_files;

        let mut outcome = RunOutcome::FilesUpdated;
        if ctx.config.pull_request {
            match &self.pr_creator {
                Some(creator) => {
                    let request = self.pull_request_request(&ctx, &summary.updated_files);
                    let pull_request = creator.create(&request).await?;
                    self.report(RunEvent::Submitted(&pull_request));
                    summary.pull_request = Some(pull_request);
                    outcome = RunOutcome::PullRequestCreated;
                }
                None => log::warn!("no pull request creator configured, skipping submission"),
            }
        }

        self.report(RunEvent::Done);
        summary.finish(outcome);
        Ok(summary)
    }

    fn fetcher_args(&self, ctx: &RunContext) -> FetcherArgs {
        FetcherArgs {
            source: ctx.source.clone(),
            credentials: ctx.config.credentials.clone(),
            repo_contents_path: ctx.config.repo_contents_path.clone(),
            options: ctx.config.options.clone(),
            git: self.git.clone(),
        }
    }

    /// Clone (or reuse) the repository and read its dependency files.
    ///
    /// Failures the error classification recognizes end the fetch with
    /// `FetchOutcome::Handled`; anything else propagates unchanged.
    pub async fn fetch_files(
        &self,
        ctx: &RunContext,
        fetcher: &dyn FileFetcher,
    ) -> Result<FetchOutcome, AppError> {
        match self.clone_and_read(ctx, fetcher).await {
            Ok(files) => Ok(FetchOutcome::Files(files)),
            Err(e) => match e.fetcher_error_details() {
                Some(details) => {
                    log::warn!("handled error whilst fetching dependencies: {}", e);
                    self.report(RunEvent::FetchErrorHandled(&details));
                    Ok(FetchOutcome::Handled(details))
                }
                None => Err(e),
            },
        }
    }

    async fn clone_and_read(
        &self,
        ctx: &RunContext,
        fetcher: &dyn FileFetcher,
    ) -> Result<Vec<DependencyFile>, AppError> {
        let path = &ctx.config.repo_contents_path;

        if ctx.config.caches(CacheStep::Files) && path.is_dir() {
            self.report(RunEvent::ReadingClone { path });
        } else {
            self.report(RunEvent::Cloning { path });
            if path.exists() {
                tokio::fs::remove_dir_all(path)
                    .await
                    .map_err(|e| IoError::generic(path.clone(), e))?;
            }
            self.progress
                .spinner(&format!("cloning {}", ctx.source.repo));
            let cloned = fetcher.clone_repo_contents().await;
            self.progress.finish_and_clear();
            cloned?;
        }

        if let Some(commit) = &ctx.config.commit {
            self.report(RunEvent::CheckingOutCommit { commit });
            self.git.checkout(path, commit)?;
        }

        fetcher.files().await
    }

    fn parse(&self, ctx: &RunContext) -> Result<Vec<Dependency>, AppError> {
        self.report(RunEvent::Parsing);
        let parser = self.ecosystem.file_parser(ParserArgs {
            dependency_files: ctx.files.clone(),
            repo_contents_path: ctx.config.repo_contents_path.clone(),
            source: ctx.source.clone(),
            credentials: ctx.config.credentials.clone(),
            reject_external_code: ctx.config.reject_external_code,
        });
        let dependencies = parser.parse()?;
        let filter = DependencyFilter::from_names(ctx.config.dependency_names.clone());
        Ok(filter.apply(dependencies))
    }

    async fn check(
        &self,
        ctx: &RunContext,
        dependency: &Dependency,
        position: CheckPosition,
    ) -> Result<UpdateResult, AppError> {
        let args = CheckerArgs {
            dependency: dependency.clone(),
            dependency_files: ctx.files.clone(),
            credentials: ctx.config.credentials.clone(),
            repo_contents_path: ctx.config.repo_contents_path.clone(),
            requirements_update_strategy: ctx.config.requirements_update_strategy,
            options: ctx.config.options.clone(),
            security_advisories: advisories_for(&ctx.config.security_advisories, &dependency.name)
                .into_iter()
                .cloned()
                .collect(),
            ignore_conditions: ctx.config.ignore_conditions.clone(),
        };

        self.progress.spinner(&format!(
            "checking {} ({}/{})",
            dependency.name, position.index, position.total
        ));
        let checker = self.ecosystem.update_checker(args).await;
        self.progress.finish_and_clear();

        decide(
            dependency,
            checker?.as_ref(),
            position,
            ctx.config.security_updates_only,
            self.reporter.as_ref(),
        )
    }

    async fn write_files(
        &self,
        ctx: &RunContext,
        files: &[DependencyFile],
    ) -> Result<Vec<PathBuf>, AppError> {
        let mut written = Vec::new();
        for file in files {
            let path = file.path_in(&ctx.config.repo_contents_path);
            tokio::fs::write(&path, &file.content)
                .await
                .map_err(|e| IoError::generic(path.clone(), e))?;
            self.report(RunEvent::WroteFile { path: &path });
            written.push(path);
        }
        Ok(written)
    }

    fn pull_request_request(&self, ctx: &RunContext, files: &[DependencyFile]) -> PullRequestRequest {
        PullRequestRequest {
            source: ctx.source.clone(),
            base_commit: ctx.commit.clone().unwrap_or_default(),
            dependencies: ctx.updated_dependencies.clone(),
            files: files.to_vec(),
            package_manager: self.ecosystem.package_manager().to_string(),
            assignees: ctx.config.assignees.clone(),
            label_language: ctx.config.label_language,
            language_label: self.ecosystem.language_label().to_string(),
        }
    }
}
