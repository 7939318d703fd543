use crate::output::read_report;
use crate::utils::config::REPORT_SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a report JSON file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let envelope = read_report(file_path)
        .with_context(|| format!("Not a valid report: {}", file_path.display()))?;
    let report = &envelope.report;

    if report.line_info.len() != report.line_function_calls.len() {
        anyhow::bail!(
            "line_info has {} files but line_function_calls has {}",
            report.line_info.len(),
            report.line_function_calls.len()
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", envelope.version);
    println!("  Source: {}", envelope.source);
    println!("  Generated: {}", envelope.generated_at);
    println!("  Files: {}", report.line_info.len());
    println!("  Call paths: {}", report.stack_runtimes.len());
    println!("  Total ticks: {}", report.total_runtime());
    println!("  Time type: {}", report.info.time_type);
    if !report.warnings.is_empty() {
        println!("  Warnings: {}", report.warnings.len());
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Line Profile Report Schema");
    println!("Current Version: {}", REPORT_SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string              - Schema version (e.g., '1.0.0')");
        println!("  source: string               - Trace file the report came from");
        println!("  generated_at: string         - RFC 3339 timestamp");
        println!("  report: object");
        println!("    line_info: array           - One entry per source file");
        println!("      path: string");
        println!("      lines: array             - Line 1 first: [read, execs, self, inclusive]");
        println!("    stack_runtimes: array      - Flattened call tree, root first");
        println!("      path: array              - Functions from the root: {{line, endline, name, filename}}");
        println!("      runtime: number          - Self time of the node");
        println!("      calls: number            - Times the node was entered");
        println!("    line_function_calls: array - Parallel to line_info");
        println!("      path: string");
        println!("      lines: array             - Per line: {{called: [function], calling: [location]}}");
        println!("    info: object               - {{is_cover, time_type}}");
        println!("    warnings: array?           - Recoverable problems found while reducing");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("lineprof v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!();
    println!("Reduces line-level profiling traces into per-line statistics and call trees.");
}
