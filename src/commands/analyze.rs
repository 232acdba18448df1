//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads the captured buffer
//! 2. Reconstructs frames and orders them through the call tree
//! 3. Trims the stack to the target size
//! 4. Computes the stack cost and grouping key
//! 5. Writes the JSON report

use super::policy::CycleFilterPolicy;
use crate::aggregator::{
    dump_stack, structured_data_to_stack, tree_key_with_ratio, trim_stack, StackReconstructor,
};
use crate::output::write_report;
use crate::parser::{load_buffer, max_timestamp, TraceReport};
use crate::utils::config::{FilterConfig, TraceConfig, SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Captured buffer (`.json` or raw little-endian records)
    pub input: PathBuf,

    /// Output path for JSON report
    pub output_json: PathBuf,

    /// Skip records before the first dispatch and close open frames
    pub strict: bool,

    /// End of capture on the buffer's time base; defaults to its latest timestamp
    pub end_time: Option<i64>,

    /// Offset added to enter times of frames closed at `end_time`
    pub time_offset: i64,

    /// Maximum frames kept in the report
    pub target_stack: usize,

    pub filter: FilterConfig,

    /// Share of the stack cost a frame needs to be a key candidate
    pub key_all_percent: f64,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Print the call tree to stdout
    pub print_tree: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self::from_config(&TraceConfig::default())
    }
}

impl AnalyzeArgs {
    /// Arguments seeded from a loaded config
    pub fn from_config(config: &TraceConfig) -> Self {
        Self {
            input: PathBuf::new(),
            output_json: PathBuf::from("report.json"),
            strict: config.strict,
            end_time: None,
            time_offset: 0,
            target_stack: config.target_stack,
            filter: config.filter.clone(),
            key_all_percent: config.key.all_percent,
            print_summary: false,
            print_tree: false,
        }
    }
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Buffer read or parse failures
/// * File write errors
pub fn execute_analyze(args: &AnalyzeArgs) -> Result<TraceReport> {
    let start_time = Instant::now();

    info!("Analyzing buffer: {}", args.input.display());

    info!("Step 1/4: Loading buffer...");
    let buffer = load_buffer(&args.input)
        .with_context(|| format!("Failed to load buffer {}", args.input.display()))?;

    let end_time = args.end_time.unwrap_or_else(|| {
        max_timestamp(&buffer).map_or(0, |t| t as i64 + args.time_offset)
    });
    debug!(
        "{} records, strict: {}, end time: {}, offset: {}",
        buffer.len(),
        args.strict,
        end_time,
        args.time_offset
    );

    info!("Step 2/4: Reconstructing call stack...");
    let reconstructor = StackReconstructor::new(args.strict)
        .with_end_time(end_time)
        .with_time_offset(args.time_offset);
    let stack = structured_data_to_stack(&buffer, &reconstructor);
    let trimmed_from = stack.items.len();

    info!("Step 3/4: Trimming {} frames to {}...", trimmed_from, args.target_stack);
    let mut items = stack.items;
    let policy = CycleFilterPolicy::new(&args.filter, args.target_stack);
    let target = isize::try_from(args.target_stack).unwrap_or(isize::MAX);
    trim_stack(&mut items, target, &policy);

    let dump = dump_stack(&items);
    let stack_key = tree_key_with_ratio(&items, dump.stack_cost, args.key_all_percent);
    debug!("Stack key: {:?}, cost: {}", stack_key, dump.stack_cost);

    info!("Step 4/4: Writing report...");
    let report = TraceReport {
        version: SCHEMA_VERSION.to_string(),
        source: args.input.display().to_string(),
        strict: args.strict,
        record_count: buffer.len(),
        stack_cost: dump.stack_cost,
        stack_key,
        tree_nodes: stack.tree_nodes,
        trimmed_from,
        items,
        generated_at: chrono::Utc::now().to_rfc3339(),
    };

    write_report(&report, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("TRACE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Buffer:      {}", report.source);
        println!("Records:     {}", report.record_count);
        println!("Frames:      {} (trimmed from {})", report.items.len(), trimmed_from);
        println!("Stack Cost:  {} ms", report.stack_cost);
        println!("Stack Key:   {}", report.stack_key);
        println!("\n{}", dump.pretty);
        println!("{}", "=".repeat(80));
    }

    if args.print_tree {
        if stack.tree_nodes > 0 {
            println!("{}", stack.tree.render());
        } else {
            println!("(no call tree: first frame was not top level)");
        }
    }

    info!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(report)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input buffer path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input buffer not found: {}", args.input.display());
    }

    if args.target_stack == 0 {
        anyhow::bail!("target_stack must be greater than 0");
    }

    if !(args.key_all_percent > 0.0 && args.key_all_percent <= 1.0) {
        anyhow::bail!("key ratio must be in (0, 1], got {}", args.key_all_percent);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn buffer_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&0u64.to_le_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_args_valid() {
        let file = buffer_file();
        let args = AnalyzeArgs {
            input: file.path().to_path_buf(),
            ..Default::default()
        };

        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        let args = AnalyzeArgs::default();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let args = AnalyzeArgs {
            input: PathBuf::from("/definitely/not/here.bin"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_target_zero() {
        let file = buffer_file();
        let args = AnalyzeArgs {
            input: file.path().to_path_buf(),
            target_stack: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_bad_ratio() {
        let file = buffer_file();
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let args = AnalyzeArgs {
                input: file.path().to_path_buf(),
                key_all_percent: ratio,
                ..Default::default()
            };
            assert!(validate_args(&args).is_err(), "ratio {} accepted", ratio);
        }
    }
}
