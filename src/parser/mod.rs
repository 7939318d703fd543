//! Trace decoding and report schema definitions.
//!
//! This module handles:
//! - The decoded event model
//! - Decoding JSON trace lines into events
//! - Defining the report schema

pub mod decoder;
pub mod event;
pub mod schema;

// Re-export main types
pub use decoder::{DecodeError, EventDecoder, JsonEventDecoder};
pub use event::{Event, FileId, FunctionSite, LineLocation, LineNo};
pub use schema::{
    CallTreePath, FileCalls, FileLines, LineCalls, LineStats, Location, ProfileInfo,
    ProfileReport,
};
