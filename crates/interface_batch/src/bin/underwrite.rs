//! Underwriting Batch Runner Binary
//!
//! Evaluates a JSON array of applications and prints one result per
//! application to stdout.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a file with the default configuration
//! underwrite applications.json
//!
//! # Read from stdin with a configuration file
//! cat applications.json | underwrite --config underwriting.toml -
//! ```
//!
//! # Environment Variables
//!
//! * `UNDERWRITING__LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `UNDERWRITING__JSON_LOGS` - Emit JSON log lines (default: false)
//! * `UNDERWRITING__ENGINE__...` - Overrides for any engine setting, e.g.
//!   `UNDERWRITING__ENGINE__BANDS__HIGH=80`

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use domain_underwriting::UnderwritingService;
use interface_batch::{build_report, read_applications, AppConfig, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(config.log_level(), config.json_logs);

    let service = UnderwritingService::new(config.engine)
        .context("Invalid underwriting configuration")?;

    tracing::info!(
        model_version = %service.model_version(),
        input = %cli.input,
        "Starting batch evaluation"
    );

    let values = if cli.reads_stdin() {
        read_applications(io::stdin().lock()).context("Failed to read applications from stdin")?
    } else {
        let file = File::open(&cli.input)
            .with_context(|| format!("Failed to open {}", cli.input))?;
        read_applications(BufReader::new(file))
            .with_context(|| format!("Failed to read applications from {}", cli.input))?
    };

    let results = service.evaluate_batch_values(&values);
    let report = build_report(&values, results);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut out, &report).context("Failed to write results")?;
    writeln!(out).context("Failed to write results")?;
    out.flush().context("Failed to write results")?;

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only the results.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}
