//! Error types for trace parsing
//!
//! Every error that aborts a parse carries the 1-based line number it was
//! raised at. Unrecognized lines are not errors and never show up here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A field that failed to parse on a line whose shape was otherwise recognized.
///
/// Raised by the record builders, which do not know which line they are
/// working on; the parser attaches the position when it turns this into a
/// [`TraceError::Format`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` has invalid value {value:?}")]
pub struct FieldError {
    pub field: &'static str,
    pub value: String,
}

impl FieldError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// The field was absent altogether.
    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "")
    }
}

#[derive(Debug, Error)]
pub enum TraceError {
    /// `TRIAL_START` while a trial is already open.
    #[error("line {line}: TRIAL_START while the trial opened at line {open_since} is still open")]
    StrayTrialStart { line: usize, open_since: usize },

    /// `TRIAL_END` with no open trial.
    #[error("line {line}: TRIAL_END without a matching TRIAL_START")]
    UnmatchedTrialEnd { line: usize },

    /// A recognized line whose fields do not parse.
    #[error("line {line}: malformed `{field}` field in {text:?}")]
    Format {
        line: usize,
        field: &'static str,
        text: String,
    },

    /// End of input reached with a trial still open.
    #[error("trace ended inside the trial opened at line {opened_at} (start {start_time}s)")]
    IncompleteTrial { opened_at: usize, start_time: f64 },

    #[error("could not open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: read failed")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl TraceError {
    pub(crate) fn format(line: usize, text: &str, err: FieldError) -> Self {
        TraceError::Format {
            line,
            field: err.field,
            text: text.to_string(),
        }
    }

    /// The line the error was raised at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            TraceError::StrayTrialStart { line, .. }
            | TraceError::UnmatchedTrialEnd { line }
            | TraceError::Format { line, .. }
            | TraceError::Io { line, .. } => Some(*line),
            TraceError::IncompleteTrial { opened_at, .. } => Some(*opened_at),
            TraceError::Open { .. } => None,
        }
    }
}

/// Type alias for parse results
pub type TraceResult<T> = Result<T, TraceError>;
