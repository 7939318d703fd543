//! Flamegraph generation.
//!
//! This module converts the flattened call tree into SVG flamegraphs and
//! plain-text hot path summaries.

pub mod generator;

// Re-export main types
pub use generator::{escape_xml, generate_flamegraph, generate_text_summary, FlamegraphConfig};
