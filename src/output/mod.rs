//! Output writers for reports and flamegraphs.
//!
//! This module handles writing data to disk:
//! - JSON reports wrapped in a versioned envelope
//! - SVG flamegraphs

pub mod json;
pub mod svg;

// Re-export main functions
pub use json::{read_report, report_to_string, validate_path, write_report, ReportFile};
pub use svg::write_svg;
