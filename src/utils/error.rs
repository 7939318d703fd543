//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::parser::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal reasons a reduction run stops without producing a report
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid input - reused file id {file_id} (already '{existing}', now '{path}'). Were several profiles concatenated?")]
    DuplicateFileId {
        file_id: i64,
        existing: String,
        path: String,
    },

    /// A decode failure that cannot be tolerated
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Malformed profile: {count} lines could not be decoded (tolerance {tolerance}), last error: {last}")]
    TooManyMalformedLines {
        count: usize,
        tolerance: usize,
        last: DecodeError,
    },

    #[error("Unable to open trace {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading a reduction config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Profile carries no runtime to draw")]
    EmptyProfile,
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
