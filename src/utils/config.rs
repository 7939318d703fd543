//! Configuration and constants for trace reduction.

use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current output schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Highest trace format version this reader understands
pub const MAX_TRACE_VERSION: i64 = 2;

/// Number of undecodable lines tolerated before a trace counts as damaged.
/// Truncated or concatenated traces usually produce one or two.
pub const DEFAULT_MALFORMED_LINE_TOLERANCE: usize = 4;

/// File id meaning "no file" (start of stream, producers that omit the id)
pub const NO_FILE: i64 = -1;

/// Line number used together with [`NO_FILE`]
pub const NO_LINE: i64 = -1;

/// Settings for one reduction run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReduceConfig {
    /// Malformed lines absorbed before the run is aborted
    #[serde(default = "default_tolerance")]
    pub malformed_line_tolerance: usize,
}

fn default_tolerance() -> usize {
    DEFAULT_MALFORMED_LINE_TOLERANCE
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            malformed_line_tolerance: DEFAULT_MALFORMED_LINE_TOLERANCE,
        }
    }
}

impl ReduceConfig {
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.malformed_line_tolerance = tolerance;
        self
    }
}

/// Load a reduction config from a TOML file
///
/// # Example
/// ```ignore
/// // lineprof.toml
/// // malformed_line_tolerance = 2
/// let config = load_config("lineprof.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ReduceConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ReduceConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_tolerance() {
        assert_eq!(ReduceConfig::default().malformed_line_tolerance, 4);
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "malformed_line_tolerance = 2").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.malformed_line_tolerance, 2);
    }

    #[test]
    fn test_load_config_empty_uses_default() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, ReduceConfig::default());
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "malformed_line_tolerance = \"many\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
