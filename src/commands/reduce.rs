//! Reduce command implementation.
//!
//! The reduce command:
//! 1. Resolves reduction settings (config file, then CLI override)
//! 2. Reads and reduces the trace
//! 3. Calculates metrics
//! 4. Generates flamegraph
//! 5. Writes output files

use super::models::ReduceArgs;
use crate::aggregator::{
    calculate_hot_paths, calculate_runtime_distribution, hottest_lines, reduce_file,
};
use crate::flamegraph::{generate_flamegraph, generate_text_summary};
use crate::output::{write_report, write_svg};
use crate::parser::ProfileReport;
use crate::utils::config::{load_config, ReduceConfig};
use crate::utils::error::FlamegraphError;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the reduce command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Reduce command arguments
///
/// # Returns
/// The reduced report, after it has been written to disk
///
/// # Errors
/// * Config file read or parse errors
/// * Fatal trace errors (unreadable file, reused file id, too many malformed lines)
/// * File write errors
///
/// # Example
/// ```ignore
/// let args = ReduceArgs {
///     input: PathBuf::from("trace.json.gz"),
///     output_svg: Some(PathBuf::from("flamegraph.svg")),
///     print_summary: true,
///     ..Default::default()
/// };
///
/// execute_reduce(args)?;
/// ```
pub fn execute_reduce(args: ReduceArgs) -> Result<ProfileReport> {
    let start_time = Instant::now();

    info!("Starting reduction of: {}", args.input.display());

    info!("Step 1/5: Resolving settings...");
    let config = resolve_config(&args)?;
    debug!(
        "Malformed line tolerance: {}",
        config.malformed_line_tolerance
    );

    info!("Step 2/5: Reducing trace...");
    let report = reduce_file(&args.input, &config)
        .with_context(|| format!("Failed to reduce trace {}", args.input.display()))?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    info!("Step 3/5: Calculating metrics...");
    let distribution = calculate_runtime_distribution(&report.stack_runtimes);
    info!("Runtime distribution: {}", distribution.summary());
    if distribution.is_highly_concentrated() {
        info!("Top 10% of call paths account for over 80% of runtime");
    }
    let hot_paths = calculate_hot_paths(&report.stack_runtimes, args.top_paths);

    debug!("Top 3 hot paths:");
    for (i, path) in hot_paths.iter().take(3).enumerate() {
        debug!(
            "  {}. {} ticks ({:.1}%): {}",
            i + 1,
            path.runtime,
            path.percentage,
            path.stack
        );
    }

    let svg_content = if args.output_svg.is_some() {
        info!("Step 4/5: Generating flamegraph...");
        match generate_flamegraph(&report.stack_runtimes, args.flamegraph_config.as_ref()) {
            Ok(svg) => Some(svg),
            Err(FlamegraphError::EmptyProfile) => {
                warn!("No runtime recorded (coverage trace?), skipping flamegraph");
                None
            }
        }
    } else {
        info!("Step 4/5: Skipping flamegraph generation (not requested)");
        None
    };

    info!("Step 5/5: Writing output files...");
    let source = args.input.display().to_string();
    write_report(&report, &source, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if let (Some(svg), Some(svg_path)) = (svg_content, &args.output_svg) {
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("PROFILE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Trace:        {}", source);
        println!("Files:        {}", report.line_info.len());
        println!("Call paths:   {}", report.stack_runtimes.len());
        println!("Total ticks:  {}", report.total_runtime());
        println!("Time type:    {}", report.info.time_type);
        println!("\n{}", generate_text_summary(&hot_paths, 10));

        let lines = hottest_lines(&report, 10);
        if !lines.is_empty() {
            println!("\n  HOTTEST LINES");
            for spot in lines {
                println!(
                    "  {:>10} self {:>10} incl {:>8}x  {}:{}",
                    spot.self_ticks, spot.inclusive_ticks, spot.exec_count, spot.file, spot.line
                );
            }
        }
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Reduction completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Config file first, then the `--tolerance` override
///
/// **Private** - internal helper for execute_reduce
fn resolve_config(args: &ReduceArgs) -> Result<ReduceConfig> {
    let mut config = match &args.config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReduceConfig::default(),
    };

    if let Some(tolerance) = args.tolerance {
        config = config.with_tolerance(tolerance);
    }

    Ok(config)
}

/// Validate reduce arguments
///
/// **Public** - can be called before execute_reduce for early validation
pub fn validate_args(args: &ReduceArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input trace path cannot be empty");
    }

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    if args.top_paths > 1000 {
        anyhow::bail!("top_paths is too large (max 1000)");
    }

    Ok(())
}
