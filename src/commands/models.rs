use crate::flamegraph::FlamegraphConfig;
use std::path::PathBuf;

/// Arguments for the reduce command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReduceArgs {
    /// Trace file, plain JSON lines or `.gz`
    pub input: PathBuf,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Output path for SVG flamegraph (optional)
    pub output_svg: Option<PathBuf>,

    /// Number of hot paths to print with the summary
    pub top_paths: usize,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// TOML file with reduction settings
    pub config_path: Option<PathBuf>,

    /// Overrides the configured malformed-line tolerance
    pub tolerance: Option<usize>,
}

impl Default for ReduceArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_json: PathBuf::from("report.json"),
            output_svg: None,
            top_paths: 20,
            flamegraph_config: None,
            print_summary: false,
            config_path: None,
            tolerance: None,
        }
    }
}
