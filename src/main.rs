//! Binary entry point for callflow.
//!
//! This binary provides the CLI interface for the call history pipeline.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use callflow::io::{self, DirectoryPaths, Format};
use callflow::observability;
use callflow::{CallHistoryPipeline, CallflowConfig, DedupStrategy};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Callflow - Call history reconstruction from call detail records.
#[derive(Parser)]
#[command(name = "callflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "CALLFLOW_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Reconstruct call histories from a CDR report.
    Process {
        /// CDR report file (csv, json, ndjson or yaml).
        #[arg(short, long)]
        input: PathBuf,

        /// Input format; inferred from the file extension when omitted.
        #[arg(long)]
        input_format: Option<Format>,

        /// Contact center dial numbers list.
        #[arg(long)]
        dial_numbers: Option<PathBuf>,

        /// Contact center users list.
        #[arg(long)]
        users: Option<PathBuf>,

        /// Call queues list.
        #[arg(long)]
        queues: Option<PathBuf>,

        /// Platform phone numbers list.
        #[arg(long)]
        phone_numbers: Option<PathBuf>,

        /// Output format: json, yaml, or csv.
        #[arg(short, long)]
        format: Option<Format>,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Deduplication strategy: pairwise or indexed.
        #[arg(long)]
        dedup: Option<DedupStrategy>,

        /// Print the run summary as JSON.
        #[arg(long)]
        summary_json: bool,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match CallflowConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(Some(&config.logging), cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: CallflowConfig) -> callflow::Result<()> {
    match command {
        Commands::Process {
            input,
            input_format,
            dial_numbers,
            users,
            queues,
            phone_numbers,
            format,
            output,
            dedup,
            summary_json,
        } => {
            let paths = DirectoryPaths {
                dial_numbers: dial_numbers.or_else(|| config.directories.dial_numbers.clone()),
                users: users.or_else(|| config.directories.users.clone()),
                queues: queues.or_else(|| config.directories.queues.clone()),
                phone_numbers: phone_numbers.or_else(|| config.directories.phone_numbers.clone()),
            };
            let mut config = config.with_directories(paths);
            if let Some(strategy) = dedup {
                config = config.with_dedup_strategy(strategy);
            }
            let input_format = match input_format {
                Some(format) => format,
                None => Format::from_path(&input)?,
            };
            let output_format = format
                .or_else(|| output.as_deref().and_then(|p| Format::from_path(p).ok()))
                .unwrap_or(config.output.format);

            cmd_process(
                &config,
                &input,
                input_format,
                output.as_deref(),
                output_format,
                summary_json,
            )
        },

        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Process command.
fn cmd_process(
    config: &CallflowConfig,
    input: &Path,
    input_format: Format,
    output: Option<&Path>,
    output_format: Format,
    summary_json: bool,
) -> callflow::Result<()> {
    let directory = io::load_directory(&config.directories)?;

    let file = File::open(input).map_err(|e| callflow::Error::OperationFailed {
        operation: "open_input".to_string(),
        cause: format!("{}: {e}", input.display()),
    })?;
    let records = io::create_record_source(BufReader::new(file), input_format)?.read_all()?;

    let pipeline = CallHistoryPipeline::from_settings(&config.pipeline, directory);
    let result = pipeline.run(records)?;

    let sink = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| callflow::Error::OperationFailed {
                operation: "create_output".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
            io::create_history_sink(BufWriter::new(file), output_format)
        },
        None => io::create_history_sink(std::io::stdout(), output_format),
    };
    io::write_history(sink, &result.history)?;

    if summary_json {
        let rendered = serde_json::to_string_pretty(&result.summary).map_err(|e| {
            callflow::Error::OperationFailed {
                operation: "serialize_summary".to_string(),
                cause: e.to_string(),
            }
        })?;
        eprintln!("{rendered}");
    } else {
        eprintln!("{}", result.summary);
    }

    Ok(())
}

/// Config command.
fn cmd_config(config: &CallflowConfig, show: bool) -> callflow::Result<()> {
    if show {
        match &config.source {
            Some(path) => println!("# Loaded from {}", path.display()),
            None => println!("# Built-in defaults"),
        }
        print!("{}", config.to_toml()?);
    } else if let Some(path) = CallflowConfig::default_path() {
        println!("Default config path: {}", path.display());
        println!("Use --show to display the effective configuration.");
    } else {
        println!("Use --show to display the effective configuration.");
    }
    Ok(())
}
