//! Trial stream
//!
//! [`TraceParser`] drives the classifier and the accumulator over a
//! [`BufRead`] source and yields each trial as soon as its `TRIAL_END` line
//! is read. Only the trial being built is held in memory, so traces of any
//! size parse in bounded space, and a consumer that stops pulling (say
//! `.take(3)`) never reads the rest of the input.
//!
//! The stream is forward-only. The first error ends it: after yielding an
//! `Err` the iterator is exhausted. A trace that ends inside a trial yields
//! [`TraceError::IncompleteTrial`] as its last item, after every trial that
//! did close.
//!
//! Lines are decoded lossily: bytes that are not UTF-8 (a Latin-1 operator
//! name in a header, say) become U+FFFD and the line is classified as usual.

use super::accumulator::TrialAccumulator;
use super::classification::classify_line;
use super::error::{TraceError, TraceResult};
use super::records::Trial;
use std::io::{BufRead, Cursor};
use std::iter::FusedIterator;
use tracing::trace;

/// Line counts gathered while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub unrecognized: usize,
    /// Recognized records that arrived while no trial was open.
    pub outside_trial: usize,
    pub trials: usize,
}

pub struct TraceParser<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    accumulator: TrialAccumulator,
    unrecognized: usize,
    trials: usize,
    done: bool,
}

impl<R: BufRead> TraceParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            accumulator: TrialAccumulator::new(),
            unrecognized: 0,
            trials: 0,
            done: false,
        }
    }

    /// Counts for everything read so far.
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            lines: self.line_number,
            unrecognized: self.unrecognized,
            outside_trial: self.accumulator.outside_trial(),
            trials: self.trials,
        }
    }

    /// Read lines until a trial seals, the input ends, or an error occurs.
    fn advance(&mut self) -> TraceResult<Option<Trial>> {
        loop {
            self.buf.clear();
            let line_number = self.line_number + 1;
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| TraceError::Io {
                    line: line_number,
                    source,
                })?;
            if read == 0 {
                break;
            }
            self.line_number = line_number;

            let decoded = String::from_utf8_lossy(&self.buf);
            let text = decoded.trim_end_matches(['\r', '\n']);
            let kind = classify_line(text)
                .map_err(|err| TraceError::format(line_number, text, err))?;
            if !kind.is_recognized() {
                trace!(line = line_number, "skipping unrecognized line");
                self.unrecognized += 1;
                continue;
            }

            if let Some(trial) = self.accumulator.apply(line_number, kind)? {
                self.trials += 1;
                return Ok(Some(trial));
            }
        }
        self.accumulator.finish()?;
        Ok(None)
    }
}

impl<R: BufRead> Iterator for TraceParser<R> {
    type Item = TraceResult<Trial>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(trial)) => Some(Ok(trial)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for TraceParser<R> {}

/// Parse a whole trace held in memory.
pub fn parse_str(source: &str) -> TraceResult<Vec<Trial>> {
    TraceParser::new(Cursor::new(source)).collect()
}

/// Parse every trial from a reader.
pub fn parse_reader<R: BufRead>(reader: R) -> TraceResult<Vec<Trial>> {
    TraceParser::new(reader).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIALS: &str = "\
** CONVERTED FROM raw.edf
MSG 1000 TRIAL_START
1001 10.0 20.0 900.0 ...
MSG 1100 TRIAL_END
MSG 2000 TRIAL_START
MSG 2100 TRIAL_END
";

    #[test]
    fn test_yields_trials_in_order() {
        let trials = parse_str(TWO_TRIALS).unwrap();
        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].start_time, 1.0);
        assert_eq!(trials[0].gaze.len(), 1);
        assert_eq!(trials[1].start_time, 2.0);
    }

    #[test]
    fn test_stats_count_lines() {
        let mut parser = TraceParser::new(Cursor::new(TWO_TRIALS));
        while let Some(result) = parser.next() {
            result.unwrap();
        }
        assert_eq!(
            parser.stats(),
            ParseStats {
                lines: 6,
                unrecognized: 1,
                outside_trial: 0,
                trials: 2,
            }
        );
    }

    #[test]
    fn test_stops_after_first_error() {
        let source = "MSG 1000 TRIAL_END\nMSG 2000 TRIAL_START\nMSG 2100 TRIAL_END\n";
        let mut parser = TraceParser::new(Cursor::new(source));
        assert!(matches!(
            parser.next(),
            Some(Err(TraceError::UnmatchedTrialEnd { line: 1 }))
        ));
        assert!(parser.next().is_none());
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_early_stop_does_not_read_further() {
        let source = format!("{TWO_TRIALS}MSG 3000 TRIAL_START\n");
        let mut parser = TraceParser::new(Cursor::new(source.as_str()));
        let first: Vec<_> = parser.by_ref().take(1).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(parser.stats().lines, 4);
    }

    #[test]
    fn test_incomplete_trial_follows_sealed_ones() {
        let source = format!("{TWO_TRIALS}MSG 3000 TRIAL_START\n1.0 ...\n");
        let results: Vec<_> = TraceParser::new(Cursor::new(source.as_str())).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(TraceError::IncompleteTrial { opened_at: 7, .. })
        ));
    }

    #[test]
    fn test_format_error_reports_line() {
        let source = "MSG 1000 TRIAL_START\nSFIX R\nEFIX R abc 1200 140 605.0 405.0 1150\n";
        let err = parse_str(source).unwrap_err();
        match err {
            TraceError::Format { line, field, text } => {
                assert_eq!(line, 3);
                assert_eq!(field, "start");
                assert_eq!(text, "EFIX R abc 1200 140 605.0 405.0 1150");
            }
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_noise_is_skipped() {
        let source: &[u8] = b"** RECORDED BY M\xfcller\nMSG 1000 TRIAL_START\nMSG 1100 TRIAL_END\n";
        let mut parser = TraceParser::new(Cursor::new(source));
        let trials: Vec<_> = parser.by_ref().collect::<TraceResult<_>>().unwrap();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].end_time, 1.1);
        assert_eq!(parser.stats().unrecognized, 1);
    }

    #[test]
    fn test_non_utf8_message_text_reaches_the_builder() {
        let source: &[u8] =
            b"MSG 1000 TRIAL_START\nMSG 1001 !V TRIAL_VAR scene_name caf\xe9\nMSG 1100 TRIAL_END\n";
        let trials = parse_reader(Cursor::new(source)).unwrap();
        assert_eq!(trials[0].scene_name.as_deref(), Some("caf\u{fffd}"));
    }

    #[test]
    fn test_read_failure_is_an_io_error() {
        struct Failing;
        impl std::io::Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
            }
        }
        let err = parse_reader(std::io::BufReader::new(Failing)).unwrap_err();
        assert!(matches!(err, TraceError::Io { line: 1, .. }));
    }

    #[test]
    fn test_crlf_line_endings() {
        let trials = parse_str("MSG 1000 TRIAL_START\r\nMSG 1100 TRIAL_END\r\n").unwrap();
        assert_eq!(trials.len(), 1);
    }

    #[test]
    fn test_empty_input_has_no_trials() {
        assert!(parse_str("").unwrap().is_empty());
    }
}
