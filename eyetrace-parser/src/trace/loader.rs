//! Trace loading utilities
//!
//! `TraceLoader` opens a trace from a file, a string or any reader and hands
//! back either the lazy trial stream or every trial at once. It is what the
//! CLI and the tests use.
//!
//! # Example
//!
//! ```rust
//! use eyetrace_parser::trace::loader::TraceLoader;
//!
//! // From file, one trial at a time
//! for trial in TraceLoader::from_path("samples.asc").unwrap().trials() {
//!     let trial = trial.unwrap();
//!     println!("{} gaze samples", trial.gaze.len());
//! }
//!
//! // From string, all at once
//! let trials = TraceLoader::from_string("MSG 1 TRIAL_START\nMSG 2 TRIAL_END\n")
//!     .parse()
//!     .unwrap();
//! ```

use super::error::{TraceError, TraceResult};
use super::parser::TraceParser;
use super::records::Trial;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use tracing::debug;

pub struct TraceLoader {
    reader: Box<dyn BufRead>,
}

impl TraceLoader {
    /// Open a trace file. The file is streamed, not read up front.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TraceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened trace");
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_string<S: Into<String>>(source: S) -> Self {
        Self::from_reader(Cursor::new(source.into()))
    }

    pub fn from_reader<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// The lazy trial stream.
    pub fn trials(self) -> TraceParser<Box<dyn BufRead>> {
        TraceParser::new(self.reader)
    }

    /// Read the whole trace, failing on the first error.
    pub fn parse(self) -> TraceResult<Vec<Trial>> {
        self.trials().collect()
    }
}
