//! lineprof CLI
//!
//! Reduces line-level profiling traces into per-line statistics, call
//! cross-references and call-tree runtimes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use lineprof::commands::{
    display_schema, display_version, execute_reduce, validate_args, validate_report_file,
    ReduceArgs,
};
use lineprof::flamegraph::FlamegraphConfig;

/// lineprof - line-level profile reduction
#[derive(Parser, Debug)]
#[command(name = "lineprof")]
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
    /// Reduce a trace into a report
    Reduce {
        /// Trace file (JSON lines, optionally .gz)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also write an SVG flamegraph
        #[arg(short, long, num_args = 0..=1, default_missing_value = "flamegraph.svg")]
        flamegraph: Option<PathBuf>,

        /// Number of hot paths in the summary
        #[arg(long, default_value = "20")]
        top_paths: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Malformed lines tolerated before giving up
        #[arg(long, env = "LINEPROF_TOLERANCE")]
        tolerance: Option<usize>,

        /// TOML file with reduction settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value = "1200")]
        width: usize,
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
        Commands::Reduce {
            input,
            output,
            flamegraph,
            top_paths,
            summary,
            tolerance,
            config,
            title,
            width,
        } => {
            let fg_config = flamegraph.as_ref().map(|_| {
                let mut fg = FlamegraphConfig::new().with_width(width);
                if let Some(title) = title {
                    fg = fg.with_title(title);
                }
                fg
            });

            let args = ReduceArgs {
                input,
                output_json: output,
                output_svg: flamegraph,
                top_paths,
                flamegraph_config: fg_config,
                print_summary: summary,
                config_path: config,
                tolerance,
            };

            validate_args(&args)?;
            execute_reduce(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
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
