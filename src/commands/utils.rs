use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Stack Cost: {} ms", report.stack_cost);
    println!("  Stack Key: {}", report.stack_key);
    println!("  Frames: {}", report.items.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Trace Canary Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string        - Schema version (e.g., '1.0.0')");
        println!("  source: string         - Buffer file the report was built from");
        println!("  strict: bool           - Strict reconstruction used");
        println!("  record_count: number   - Records in the buffer, padding included");
        println!("  stack_cost: number     - Longest frame in milliseconds");
        println!("  stack_key: string      - Method id of the dominant frame");
        println!("  tree_nodes: number     - Call tree size (0 = malformed tree)");
        println!("  trimmed_from: number   - Frame count before trimming");
        println!("  items: array           - Frames in chronological order");
        println!("    method_id: number    - Instrumented method id");
        println!("    duration: number     - Time in frame (ms)");
        println!("    depth: number        - Nesting level at close");
        println!("    count: number        - Merged repeat calls");
        println!("  generated_at: string   - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Trace Canary v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Call-stack reconstruction for method enter/exit trace buffers.");
}
