//! bumpbot - dependency update driver CLI
//!
//! Checks the dependencies declared in one directory of a repository, and
//! optionally writes the updated files back or opens a pull request.

use bumpbot::cli::CliArgs;
use bumpbot::config::RunConfig;
use bumpbot::ecosystem::for_package_manager;
use bumpbot::forge::creator_for;
use bumpbot::git::SystemGit;
use bumpbot::orchestrator::Orchestrator;
use bumpbot::output::{create_reporter, write_summary, OutputConfig};
use bumpbot::progress::Progress;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

fn initialize_logger(debug: bool) -> anyhow::Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("bumpbot")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = initialize_logger(args.debug) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let config = RunConfig::from_args(&args, &cwd)?;
    log::debug!(
        "bumpbot v{}: {} {} in {}",
        env!("CARGO_PKG_VERSION"),
        config.package_manager,
        config.repo,
        config.directory
    );

    let ecosystem = for_package_manager(&config.package_manager)?;
    let output_config = OutputConfig::from_cli(args.json, args.diff, args.quiet);

    let mut orchestrator = Orchestrator::new(
        ecosystem,
        Arc::new(SystemGit::new()),
        create_reporter(&output_config),
    )
    .with_progress(Progress::new(output_config.shows_progress()));
    if config.pull_request {
        orchestrator =
            orchestrator.with_pull_request_creator(creator_for(config.provider, &config.credentials)?);
    }

    let summary = orchestrator.run(config).await?;

    let mut stdout = io::stdout().lock();
    write_summary(&output_config, &summary, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
