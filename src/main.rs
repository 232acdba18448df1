//! Trace Canary CLI
//!
//! Reconstructs call stacks from captured method trace buffers and writes
//! trimmed, keyed reports.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use trace_canary::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_report_file,
    AnalyzeArgs,
};
use trace_canary::utils::config::{load_config, TraceConfig};

/// Trace Canary - call-stack reconstruction for method trace buffers
#[derive(Parser, Debug)]
#[command(name = "trace-canary")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconstruct, trim and key a captured buffer
    Analyze {
        /// Buffer file (.json array or raw little-endian u64 records)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// TOML config with reconstruction and trimming settings
        #[arg(short, long, env = "TRACE_CANARY_CONFIG")]
        config: Option<PathBuf>,

        /// Force strict mode on
        #[arg(long, conflicts_with = "lenient")]
        strict: bool,

        /// Force strict mode off
        #[arg(long)]
        lenient: bool,

        /// End of capture in ms on the buffer's time base (default: latest timestamp)
        #[arg(long)]
        end_time: Option<i64>,

        /// Time base offset in ms applied to frames still open at end time
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,

        /// Maximum frames kept in the report
        #[arg(long)]
        target_stack: Option<usize>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Print the call tree to stdout
        #[arg(long)]
        tree: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            strict,
            lenient,
            end_time,
            offset,
            target_stack,
            summary,
            tree,
        } => {
            let config = match config {
                Some(path) => load_config(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => TraceConfig::default(),
            };

            let mut args = AnalyzeArgs::from_config(&config);
            args.input = input;
            args.output_json = output;
            args.end_time = end_time;
            args.time_offset = offset;
            args.print_summary = summary;
            args.print_tree = tree;
            if strict {
                args.strict = true;
            } else if lenient {
                args.strict = false;
            }
            if let Some(target) = target_stack {
                args.target_stack = target;
            }

            validate_args(&args)?;
            execute_analyze(&args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
