//! multi-lookup - Concurrent Domain Name Resolver
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use multi_lookup::config::{CliArgs, LookupConfig};
use multi_lookup::pipeline::LookupRunner;
use multi_lookup::progress::{print_header, print_summary};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = LookupConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            config.requester_count,
            config.resolver_count,
            config.input_files.len(),
            config.buffer_size,
        );
    }

    let show_summary = config.show_progress;
    let requester_log = config.requester_log.clone();
    let resolver_log = config.resolver_log.clone();

    let runner = LookupRunner::new(config).context("Failed to initialize lookup")?;
    let report = runner.run().context("Lookup failed")?;

    if show_summary {
        print_summary(&report, &requester_log, &resolver_log);
    }

    if report.missing_files > 0 {
        info!(missing = report.missing_files, "Some data files were skipped");
    }

    if !report.is_complete() {
        warn!(
            produced = report.names_produced,
            consumed = report.names_consumed,
            "Lookup finished with unprocessed work"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("multi_lookup=debug,warn")
    } else {
        EnvFilter::new("multi_lookup=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
