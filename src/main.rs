//! OME Validator - schema validation for OME-XML microscopy metadata.
//!
//! This binary validates the given files and prints one verdict line per
//! file, with optional verbose reports or JSON output.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ome_validator::{
    config::Config,
    report::{OmeValidator, SourceKind, XmlReport},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(&config.log_filter);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let validator = match build_validator(&config) {
        Ok(validator) => validator,
        Err(e) => {
            error!("Schema error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut all_ok = true;
    let mut summaries = Vec::new();

    for path in &config.files {
        match validator.validate_path(path).await {
            Ok(report) => {
                if !report.is_xsd_valid {
                    all_ok = false;
                }
                if config.json {
                    summaries.push(serde_json::to_value(report.to_summary()).unwrap_or_default());
                } else {
                    print_report(path, &report, config.verbose);
                }
            }
            Err(e) => {
                all_ok = false;
                error!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    if config.json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize reports: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Build the validator against the bundled schema or the one configured.
fn build_validator(config: &Config) -> Result<OmeValidator, ome_validator::error::SchemaError> {
    match &config.schema {
        Some(path) => OmeValidator::from_schema_file(path),
        None => OmeValidator::bundled(),
    }
}

/// Print the verdict line and, in verbose mode, the full report.
fn print_report(path: &Path, report: &XmlReport, verbose: bool) {
    if report.is_xsd_valid {
        println!("File OK: {}", path.display());
    } else {
        println!("File Invalid: {}", path.display());
    }

    if !verbose {
        return;
    }

    print!("{}", report.summary());

    // For OME-TIFFs, show the extracted metadata both re-indented and as
    // it appears in the container.
    if report.kind == SourceKind::Tiff && report.is_ome_tiff {
        if let Ok(pretty) = report.to_pretty_xml() {
            println!();
            println!("{}", pretty);
        }
        if let Ok(raw) = report.to_raw_xml() {
            println!("{}", raw);
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
