//! CAMS site extractor.
//!
//! Scans a CAMS product collection, samples every AOT product at one site and
//! writes one time series per species regime.

mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use config::Args;
use extraction::{ExtractionError, Extractor};

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Extraction failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: &Args) -> Result<u8> {
    let options = args.extract_options();
    let site = args.site();

    info!(
        directory = %args.directory.display(),
        output = %args.output.display(),
        site = %site,
        workers = options.workers,
        "Starting CAMS site extraction"
    );

    let extractor = Extractor::new(options)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let report = runtime.block_on(extractor.run(&args.directory, &args.output, site))?;

    print!("{report}");

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote run report");
    }

    if let Err(ExtractionError::NoUsableObservations { failed }) = report.ensure_usable() {
        error!(failed, "No usable observations");
    }

    Ok(report.exit_code() as u8)
}
