//! Sieve - fuzzy trigram search over JSON corpora.
//!
//! CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sieve::cli::{SearchCommand, SearchOptions, StatsCommand, StatsOptions};
use sieve::config::{Config, SearchConfig};
use sieve::error::exit_codes;
use sieve::{IndexManager, JsonDirSource, SieveError};

// =============================================================================
// CLI Definition
// =============================================================================

/// Sieve - fuzzy trigram search over JSON corpora
#[derive(Parser)]
#[command(name = "sieve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of <category>.json corpus files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a category
    Search {
        /// Category to search (e.g. jobs)
        category: String,
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
        /// Minimum relevance score in [0.0, 1.0]
        #[arg(long, short)]
        threshold: Option<f64>,
    },

    /// Build the index and show its size
    Stats {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sieve error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Install a stderr subscriber filtered by `SIEVE_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIEVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<ExitCode, SieveError> {
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(dir) = cli.data_dir {
        config.source.data_dir = dir;
    }

    match cli.command {
        Commands::Search {
            category,
            query,
            json,
            quiet,
            limit,
            threshold,
        } => {
            if let Some(t) = threshold {
                if !SearchConfig::is_valid_threshold(t) {
                    return Err(SieveError::config(format!(
                        "--threshold must be in [0.0, 1.0], got {}",
                        t
                    )));
                }
                config.search.threshold = t;
            }
            config.validate()?;

            let source = JsonDirSource::new(&config.source.data_dir);
            let cmd = SearchCommand::new(IndexManager::from_config(source, &config));
            let options = SearchOptions { json, quiet, limit };
            let output = cmd.run(&category, &query, &options);
            emit(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success))
        }

        Commands::Stats { json, quiet } => {
            config.validate()?;

            let source = JsonDirSource::new(&config.source.data_dir);
            let cmd = StatsCommand::new(IndexManager::from_config(source, &config));
            let options = StatsOptions { json, quiet };
            let output = cmd.run();
            emit(&cmd.format_output(&output, &options));
            Ok(success_to_exit_code(output.success()))
        }
    }
}

/// Print command output, ending with exactly one newline.
fn emit(text: &str) {
    if !text.is_empty() {
        println!("{}", text.trim_end());
    }
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}
