//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod reduce;
pub mod utils;

// Re-export main command functions
pub use models::ReduceArgs;
pub use reduce::{execute_reduce, validate_args};
pub use utils::{display_schema, display_version, validate_report_file};
