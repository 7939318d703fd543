//! Trace input.
//!
//! Traces are read line by line, plain or gzip-compressed. Compression is
//! detected by the `.gz` extension.

pub mod stream;

pub use stream::{open_trace, TraceLines};
