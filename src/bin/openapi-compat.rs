//! OpenAPI compatibility CLI
//!
//! Command-line interface for comparing and normalizing OpenAPI documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use openapi_compat::{compare, load_document_auto, to_string};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-compat")]
#[command(about = "Check OpenAPI documentation against the API it documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare documentation against the source document
    Compare {
        /// Documentation: file path or URL (http:// or https://)
        doc: String,

        /// Source document (e.g. generated from code): file path or URL
        source: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Read a document and print it as canonical YAML with references inlined
    Normalize {
        /// Document: file path or URL (http:// or https://)
        doc: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Machine-readable result of `compare --json`.
#[derive(Serialize)]
struct CompareReport<'a> {
    compatible: bool,
    violations: &'a [String],
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare { doc, source, json } => run_compare(&doc, &source, json),
        Commands::Normalize { doc, output } => run_normalize(&doc, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr so stdout stays machine-readable. Verbosity from `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_compare(doc_source: &str, source_source: &str, json_output: bool) -> Result<(), u8> {
    let doc = load_document_auto(doc_source).map_err(|e| {
        report_error(json_output, &format!("loading doc: {}", e));
        e.exit_code() as u8
    })?;

    let source = load_document_auto(source_source).map_err(|e| {
        report_error(json_output, &format!("loading source: {}", e));
        e.exit_code() as u8
    })?;

    let violations = compare(&doc, &source);
    let compatible = violations.is_empty();

    if json_output {
        let report = CompareReport {
            compatible,
            violations: &violations,
        };
        let json = serde_json::to_string(&report).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json);
    } else if compatible {
        println!("Compatible");
    } else {
        eprintln!("Documentation is incompatible with source:");
        for violation in &violations {
            eprintln!("  {}", violation);
        }
    }

    if compatible {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_normalize(doc_source: &str, output: Option<PathBuf>) -> Result<(), u8> {
    let doc = load_document_auto(doc_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let yaml = to_string(&doc).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &yaml).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", yaml);
        }
    }

    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        let output = serde_json::json!({
            "compatible": false,
            "error": msg
        });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}
