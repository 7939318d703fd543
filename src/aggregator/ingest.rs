//! Drive a whole trace through the decoder and the tracker.

use super::tracker::CallStackTracker;
use crate::input::{open_trace, TraceLines};
use crate::parser::{EventDecoder, JsonEventDecoder, ProfileReport};
use crate::utils::config::ReduceConfig;
use crate::utils::error::ProfileError;
use log::{debug, info};
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::Path;

/// Reduce a stream of trace lines into a report
///
/// **Public** - main entry point of the aggregator
///
/// Blank lines are skipped and do not count as malformed.
///
/// # Arguments
/// * `lines` - Trace lines without line terminators
/// * `decoder` - Turns each line into an event
/// * `config` - Reduction settings (malformed-line tolerance)
///
/// # Errors
/// * `ProfileError::Io` - reading a line failed
/// * `ProfileError::DuplicateFileId` - a file id was registered twice
/// * `ProfileError::Decode` - the trace format is too new
/// * `ProfileError::TooManyMalformedLines` - the tolerance was exceeded
pub fn reduce_lines<I, D>(
    lines: I,
    decoder: &D,
    config: &ReduceConfig,
) -> Result<ProfileReport, ProfileError>
where
    I: IntoIterator<Item = io::Result<String>>,
    D: EventDecoder + ?Sized,
{
    let mut tracker = CallStackTracker::new(config);
    let mut events = 0usize;
    let mut kinds: BTreeMap<&'static str, usize> = BTreeMap::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match decoder.decode(&line) {
            Ok(event) => {
                *kinds.entry(event.kind()).or_default() += 1;
                tracker.process(event)?;
                events += 1;
            }
            Err(e) => {
                debug!("Line {}: {}", index + 1, e);
                tracker.record_decode_failure(e)?;
            }
        }
    }

    info!(
        "Processed {} events ({} malformed lines skipped), {} ticks total",
        events,
        tracker.malformed_lines(),
        tracker.total_ticks()
    );
    debug!("Events by kind: {:?}", kinds);

    Ok(tracker.into_report())
}

/// Reduce a JSON-lines trace from any buffered reader
///
/// **Public** - convenience wrapper over `reduce_lines`
pub fn reduce_reader<R: BufRead>(
    reader: R,
    config: &ReduceConfig,
) -> Result<ProfileReport, ProfileError> {
    reduce_lines(TraceLines::new(reader), &JsonEventDecoder::new(), config)
}

/// Reduce a trace file, gzip-compressed if it ends in `.gz`
///
/// **Public** - used by the `reduce` command
///
/// # Errors
/// * `ProfileError::OpenFailed` - the file cannot be opened
/// * Anything `reduce_lines` returns
pub fn reduce_file(
    path: impl AsRef<Path>,
    config: &ReduceConfig,
) -> Result<ProfileReport, ProfileError> {
    let path = path.as_ref();
    info!("Reading trace from: {}", path.display());

    let lines = open_trace(path)?;
    reduce_lines(lines, &JsonEventDecoder::new(), config)
}
