//! finance-cli: JSON finance reports over an exported account snapshot.
//!
//! Usage:
//!   finance-cli tax
//!   finance-cli budget --pretty
//!   finance-cli harvest --ticker VTI --lookback-days 30
//!   finance-cli allocation --snapshot ./snapshot.json
//!
//! Configuration comes from the environment (or `.env`): FINANCE_SNAPSHOT_PATH,
//! FILING_STATUS, TAX_YEAR, TAX_TABLES_PATH, REFERENCE_DATE and the HARVEST_*
//! rates. Logs go to stderr; stdout carries only the report.

mod cli;
mod commands;


use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use finance_core::JsonFileSource;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

fn init_tracing(verbose: bool) {
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let rendered = match commands::load_config(cli.snapshot.as_deref(), |key| std::env::var(key).ok()) {
        Ok(config) => {
            tracing::debug!(
                "Running {:?} for {} ({}), reference date {}",
                cli.command,
                config.tax_year,
                config.filing_status,
                config.reference_date
            );
            let source = JsonFileSource::new(config.snapshot_path.clone());
            commands::execute(&cli.command, &config, &source)
        }
        Err(e) => {
            tracing::error!("{}", e);
            commands::error_output(e)
        }
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&rendered.json)
    } else {
        serde_json::to_string(&rendered.json)
    }
    .context("failed to serialize report")?;
    println!("{}", text);

    Ok(rendered.ok)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
