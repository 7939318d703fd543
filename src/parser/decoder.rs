//! JSON line decoder for profiling traces.
//!
//! Each line of a trace is one JSON object, e.g.
//! `{"Type":"E","FileId":3,"Line":12,"Ticks":40}`. The decoder turns a line
//! into an [`Event`] or a [`DecodeError`]; only a too-new format version is
//! fatal, every other failure is left to the caller's tolerance budget.

use super::event::{Event, LineLocation};
use crate::utils::config::{MAX_TRACE_VERSION, NO_FILE, NO_LINE};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while decoding one trace line
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record has no 'Type'")]
    MissingType,

    #[error("Invalid 'Type' in profile: {0:?}")]
    InvalidType(String),

    #[error("{kind} record is missing '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Trace format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i64, supported: i64 },
}

impl DecodeError {
    /// Whether this failure must abort the run instead of being tolerated
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::UnsupportedVersion { .. })
    }
}

/// Turns one line of text into an event
pub trait EventDecoder {
    fn decode(&self, line: &str) -> Result<Event, DecodeError>;
}

/// Raw record as it appears on the wire; every field is optional here and
/// checked per record kind afterwards
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(rename = "Type")]
    kind: Option<String>,

    #[serde(rename = "FileId")]
    file_id: Option<i64>,

    #[serde(rename = "Line")]
    line: Option<i64>,

    #[serde(rename = "EndLine")]
    end_line: Option<i64>,

    #[serde(rename = "Fun")]
    fun: Option<String>,

    #[serde(rename = "Ticks")]
    ticks: Option<i64>,

    #[serde(rename = "Execs")]
    execs: Option<i64>,

    #[serde(rename = "File")]
    file: Option<String>,

    #[serde(rename = "Version")]
    version: Option<i64>,

    #[serde(rename = "IsCover")]
    is_cover: Option<bool>,

    #[serde(rename = "TimeType")]
    time_type: Option<String>,
}

/// Record kinds, keyed by the first character of `Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Read,
    Exec,
    IntoFun,
    OutFun,
    StringId,
    Info,
}

impl RecordKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.chars().next()? {
            'R' => Some(Self::Read),
            'E' | 'X' => Some(Self::Exec),
            'I' => Some(Self::IntoFun),
            'O' => Some(Self::OutFun),
            'S' => Some(Self::StringId),
            '_' => Some(Self::Info),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Exec => "Exec",
            Self::IntoFun => "EnterFunction",
            Self::OutFun => "ExitFunction",
            Self::StringId => "InternFile",
            Self::Info => "Info",
        }
    }
}

/// Default decoder for JSON-lines traces
#[derive(Debug, Clone)]
pub struct JsonEventDecoder {
    max_version: i64,
}

impl Default for JsonEventDecoder {
    fn default() -> Self {
        Self {
            max_version: MAX_TRACE_VERSION,
        }
    }
}

impl JsonEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, line: &str) -> Result<Event, DecodeError> {
        let raw: RawRecord = serde_json::from_str(line)?;

        if let Some(version) = raw.version {
            if version > self.max_version {
                return Err(DecodeError::UnsupportedVersion {
                    found: version,
                    supported: self.max_version,
                });
            }
        }

        let tag = raw.kind.as_deref().ok_or(DecodeError::MissingType)?;
        let kind =
            RecordKind::from_tag(tag).ok_or_else(|| DecodeError::InvalidType(tag.to_string()))?;

        build_event(kind, raw)
    }
}

fn required<T>(value: Option<T>, kind: RecordKind, field: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingField {
        kind: kind.name(),
        field,
    })
}

fn build_event(kind: RecordKind, raw: RawRecord) -> Result<Event, DecodeError> {
    let event = match kind {
        RecordKind::Read => Event::Read {
            file_id: required(raw.file_id, kind, "FileId")?,
            line: required(raw.line, kind, "Line")?,
        },
        RecordKind::Exec => {
            let ticks = raw.ticks.unwrap_or(0);
            if ticks < 0 {
                debug!("Clamping negative tick count {} to 0", ticks);
            }
            Event::Exec {
                file_id: required(raw.file_id, kind, "FileId")?,
                line: required(raw.line, kind, "Line")?,
                ticks: ticks.max(0) as u64,
                exec_count: raw.execs.unwrap_or(1).max(0) as u64,
            }
        }
        RecordKind::IntoFun => Event::EnterFunction {
            name: required(raw.fun, kind, "Fun")?,
            line: required(raw.line, kind, "Line")?,
            end_line: required(raw.end_line, kind, "EndLine")?,
            file: required(raw.file, kind, "File")?,
            file_id: raw.file_id.unwrap_or(NO_FILE),
        },
        RecordKind::OutFun => Event::ExitFunction,
        RecordKind::StringId => Event::InternFile {
            file_id: required(raw.file_id, kind, "FileId")?,
            path: required(raw.file, kind, "File")?,
        },
        RecordKind::Info => Event::Info {
            is_cover: raw.is_cover.unwrap_or(false),
            time_type: raw.time_type.unwrap_or_default(),
            at: LineLocation::new(raw.file_id.unwrap_or(NO_FILE), raw.line.unwrap_or(NO_LINE)),
        },
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Result<Event, DecodeError> {
        JsonEventDecoder::new().decode(line)
    }

    #[test]
    fn test_exec_defaults() {
        let event = decode(r#"{"Type":"E","FileId":3,"Line":12}"#).unwrap();
        assert_eq!(event, Event::exec(3, 12, 0));
    }

    #[test]
    fn test_x_tag_is_exec() {
        let event = decode(r#"{"Type":"X","FileId":1,"Line":2,"Ticks":5,"Execs":3}"#).unwrap();
        assert_eq!(
            event,
            Event::Exec {
                file_id: 1,
                line: 2,
                ticks: 5,
                exec_count: 3
            }
        );
    }

    #[test]
    fn test_negative_ticks_clamp() {
        let event = decode(r#"{"Type":"E","FileId":1,"Line":2,"Ticks":-7}"#).unwrap();
        assert_eq!(event, Event::exec(1, 2, 0));
    }

    #[test]
    fn test_enter_without_file_id() {
        let event = decode(r#"{"Type":"I","Fun":"f","File":"a.g","Line":4,"EndLine":9}"#).unwrap();
        assert_eq!(event, Event::enter("f", "a.g", NO_FILE, 4, 9));
    }

    #[test]
    fn test_enter_missing_end_line() {
        let err = decode(r#"{"Type":"I","Fun":"f","File":"a.g","Line":4}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingField {
                field: "EndLine",
                ..
            }
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_exit_needs_nothing() {
        assert_eq!(decode(r#"{"Type":"O"}"#).unwrap(), Event::ExitFunction);
    }

    #[test]
    fn test_info_record() {
        let event =
            decode(r#"{"Type":"_","IsCover":true,"TimeType":"Memory","Version":1}"#).unwrap();
        assert_eq!(
            event,
            Event::Info {
                is_cover: true,
                time_type: "Memory".to_string(),
                at: LineLocation::NOWHERE,
            }
        );
    }

    #[test]
    fn test_newer_version_is_fatal() {
        let err = decode(r#"{"Type":"_","IsCover":false,"TimeType":"Wall","Version":3}"#)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_type() {
        let err = decode(r#"{"Type":"Q","FileId":1,"Line":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidType(_)));
    }

    #[test]
    fn test_truncated_line() {
        let err = decode(r#"{"Type":"E","FileId":1,"Li"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_wrong_field_type() {
        assert!(decode(r#"{"Type":"R","FileId":"one","Line":1}"#).is_err());
    }
}
