//! Trial Accumulator
//!
//! The trial boundary state machine. It owns the in-progress trial and the
//! span tracker, and is fed one classified line at a time:
//!
//! | State   | Line          | Effect                                         |
//! |---------|---------------|------------------------------------------------|
//! | Idle    | TRIAL_START   | open a trial, go to InTrial                    |
//! | InTrial | TRIAL_START   | error: StrayTrialStart                         |
//! | InTrial | record / MSG  | append record or set scalar field              |
//! | InTrial | TRIAL_END     | seal and emit the trial, reset, go to Idle     |
//! | Idle    | TRIAL_END     | error: UnmatchedTrialEnd                       |
//! | Idle    | record / MSG  | counted as outside any trial and discarded     |
//!
//! Span markers update the tracker in both states, so the tracker always
//! mirrors what the device reported. Sealing a trial resets it.

use super::builders::{self, TrialVariable};
use super::classification::LineKind;
use super::error::{TraceError, TraceResult};
use super::records::{SpanKind, Trial};
use super::spans::SpanTracker;
use tracing::{debug, trace};

/// A trial between its start and end boundaries.
#[derive(Debug)]
struct OpenTrial {
    opened_at: usize,
    trial: Trial,
}

#[derive(Debug, Default)]
pub struct TrialAccumulator {
    current: Option<OpenTrial>,
    spans: SpanTracker,
    outside_trial: usize,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_trial(&self) -> bool {
        self.current.is_some()
    }

    pub fn spans(&self) -> &SpanTracker {
        &self.spans
    }

    /// Records and messages discarded because no trial was open.
    pub fn outside_trial(&self) -> usize {
        self.outside_trial
    }

    /// Feed one classified line, read at 1-based `line`.
    ///
    /// Returns the sealed trial when `kind` closes one.
    pub fn apply(&mut self, line: usize, kind: LineKind) -> TraceResult<Option<Trial>> {
        match kind {
            LineKind::TrialStart(time) => {
                self.start_trial(line, time)?;
                Ok(None)
            }
            LineKind::TrialEnd(time) => self.end_trial(line, time).map(Some),
            LineKind::OpenFixation => {
                self.spans.open(SpanKind::Fixation);
                Ok(None)
            }
            LineKind::OpenSaccade => {
                self.spans.open(SpanKind::Saccade);
                Ok(None)
            }
            LineKind::OpenBlink => {
                self.spans.open(SpanKind::Blink);
                Ok(None)
            }
            LineKind::CloseFixation(fixation) => {
                self.spans.close(SpanKind::Fixation);
                self.with_trial(line, |trial| trial.fixations.push(fixation));
                Ok(None)
            }
            LineKind::CloseSaccade(saccade) => {
                self.spans.close(SpanKind::Saccade);
                self.with_trial(line, |trial| trial.saccades.push(saccade));
                Ok(None)
            }
            LineKind::CloseBlink(blink) => {
                self.spans.close(SpanKind::Blink);
                self.with_trial(line, |trial| trial.blinks.push(blink));
                Ok(None)
            }
            LineKind::ButtonPress(time) => {
                self.with_trial(line, |trial| trial.button_press_time = Some(time));
                Ok(None)
            }
            LineKind::StimulusOnset(time) => {
                self.with_trial(line, |trial| trial.stimulus_onset_time = Some(time));
                Ok(None)
            }
            LineKind::TrialVariable { variable, .. } => {
                self.with_trial(line, |trial| set_variable(trial, variable));
                Ok(None)
            }
            LineKind::GazeSample(raw) => {
                let sample = builders::gaze_sample(raw, &self.spans);
                self.with_trial(line, |trial| trial.gaze.push(sample));
                Ok(None)
            }
            LineKind::Unrecognized => Ok(None),
        }
    }

    /// Check the end-of-input state: a trial still open is an error.
    pub fn finish(&self) -> TraceResult<()> {
        match &self.current {
            Some(open) => Err(TraceError::IncompleteTrial {
                opened_at: open.opened_at,
                start_time: open.trial.start_time,
            }),
            None => Ok(()),
        }
    }

    fn start_trial(&mut self, line: usize, time: f64) -> TraceResult<()> {
        if let Some(open) = &self.current {
            return Err(TraceError::StrayTrialStart {
                line,
                open_since: open.opened_at,
            });
        }
        debug!(line, start_time = time, "trial opened");
        self.current = Some(OpenTrial {
            opened_at: line,
            trial: Trial::open(time),
        });
        Ok(())
    }

    fn end_trial(&mut self, line: usize, time: f64) -> TraceResult<Trial> {
        let Some(open) = self.current.take() else {
            return Err(TraceError::UnmatchedTrialEnd { line });
        };
        let mut trial = open.trial;
        trial.end_time = time;
        self.spans.reset();
        debug!(
            line,
            opened_at = open.opened_at,
            end_time = time,
            gaze = trial.gaze.len(),
            fixations = trial.fixations.len(),
            saccades = trial.saccades.len(),
            blinks = trial.blinks.len(),
            "trial sealed"
        );
        Ok(trial)
    }

    fn with_trial(&mut self, line: usize, update: impl FnOnce(&mut Trial)) {
        match &mut self.current {
            Some(open) => update(&mut open.trial),
            None => {
                trace!(line, "record outside any trial, discarded");
                self.outside_trial += 1;
            }
        }
    }
}

fn set_variable(trial: &mut Trial, variable: TrialVariable) {
    match variable {
        TrialVariable::ResponseTime(rt) => trial.response_time = Some(rt),
        TrialVariable::SceneName(name) => trial.scene_name = Some(name),
        TrialVariable::TrialIndex(index) => trial.index = Some(index),
        TrialVariable::Other { key, .. } => trace!(%key, "ignoring trial variable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::builders::RawSample;
    use crate::trace::records::{Fixation, SpanLabel};

    fn sample(time: f64) -> LineKind {
        LineKind::GazeSample(RawSample {
            time,
            x: 1.0,
            y: 2.0,
            pupil: 900.0,
        })
    }

    #[test]
    fn test_start_then_end_seals_trial() {
        let mut acc = TrialAccumulator::new();
        assert_eq!(acc.apply(1, LineKind::TrialStart(1.0)).unwrap(), None);
        assert!(acc.in_trial());

        let trial = acc.apply(2, LineKind::TrialEnd(1.6)).unwrap().unwrap();
        assert_eq!(trial.start_time, 1.0);
        assert_eq!(trial.end_time, 1.6);
        assert!(!acc.in_trial());
        assert!(acc.finish().is_ok());
    }

    #[test]
    fn test_stray_start_keeps_current_trial() {
        let mut acc = TrialAccumulator::new();
        acc.apply(1, LineKind::TrialStart(1.0)).unwrap();
        let err = acc.apply(5, LineKind::TrialStart(2.0)).unwrap_err();
        assert!(matches!(
            err,
            TraceError::StrayTrialStart {
                line: 5,
                open_since: 1
            }
        ));
        assert!(acc.in_trial());
    }

    #[test]
    fn test_end_without_start() {
        let mut acc = TrialAccumulator::new();
        let err = acc.apply(3, LineKind::TrialEnd(1.0)).unwrap_err();
        assert!(matches!(err, TraceError::UnmatchedTrialEnd { line: 3 }));
    }

    #[test]
    fn test_finish_inside_trial_is_incomplete() {
        let mut acc = TrialAccumulator::new();
        acc.apply(4, LineKind::TrialStart(1.0)).unwrap();
        let err = acc.finish().unwrap_err();
        assert!(matches!(
            err,
            TraceError::IncompleteTrial { opened_at: 4, .. }
        ));
    }

    #[test]
    fn test_scalar_fields_follow_their_messages() {
        let mut acc = TrialAccumulator::new();
        acc.apply(1, LineKind::TrialStart(1.0)).unwrap();
        acc.apply(2, LineKind::ButtonPress(1.3)).unwrap();
        acc.apply(3, LineKind::StimulusOnset(1.05)).unwrap();
        for variable in [
            TrialVariable::ResponseTime(0.45),
            TrialVariable::SceneName("kitchen".to_string()),
            TrialVariable::TrialIndex(7),
            TrialVariable::Other {
                key: "block_index".to_string(),
                value: "2".to_string(),
            },
        ] {
            acc.apply(4, LineKind::TrialVariable { time: 1.5, variable })
                .unwrap();
        }
        let trial = acc.apply(5, LineKind::TrialEnd(1.6)).unwrap().unwrap();

        assert_eq!(trial.button_press_time, Some(1.3));
        assert_eq!(trial.stimulus_onset_time, Some(1.05));
        assert_eq!(trial.response_time, Some(0.45));
        assert_eq!(trial.scene_name.as_deref(), Some("kitchen"));
        assert_eq!(trial.index, Some(7));
    }

    #[test]
    fn test_samples_are_tagged_with_open_spans() {
        let mut acc = TrialAccumulator::new();
        acc.apply(1, LineKind::TrialStart(1.0)).unwrap();
        acc.apply(2, sample(1.001)).unwrap();
        acc.apply(3, LineKind::OpenFixation).unwrap();
        acc.apply(4, sample(1.002)).unwrap();
        acc.apply(
            5,
            LineKind::CloseFixation(Fixation {
                start: 1.002,
                stop: 1.002,
                x: 1.0,
                y: 2.0,
            }),
        )
        .unwrap();
        acc.apply(6, sample(1.003)).unwrap();
        let trial = acc.apply(7, LineKind::TrialEnd(1.1)).unwrap().unwrap();

        let flags: Vec<_> = trial.gaze.iter().map(|s| (s.in_fixation, s.event)).collect();
        assert_eq!(
            flags,
            vec![
                (false, SpanLabel::None),
                (true, SpanLabel::Fixation),
                (false, SpanLabel::None),
            ]
        );
        assert_eq!(trial.fixations.len(), 1);
    }

    #[test]
    fn test_spans_reset_when_trial_seals() {
        let mut acc = TrialAccumulator::new();
        acc.apply(1, LineKind::TrialStart(1.0)).unwrap();
        acc.apply(2, LineKind::OpenBlink).unwrap();
        acc.apply(3, LineKind::TrialEnd(1.1)).unwrap();
        assert_eq!(acc.spans(), &SpanTracker::new());
    }

    #[test]
    fn test_records_outside_trials_are_discarded() {
        let mut acc = TrialAccumulator::new();
        acc.apply(1, sample(0.5)).unwrap();
        acc.apply(2, LineKind::ButtonPress(0.6)).unwrap();
        acc.apply(3, LineKind::OpenFixation).unwrap();
        assert_eq!(acc.outside_trial(), 2);
        assert!(acc.spans().in_fixation());

        acc.apply(4, LineKind::TrialStart(1.0)).unwrap();
        let trial = acc.apply(5, LineKind::TrialEnd(1.1)).unwrap().unwrap();
        assert!(trial.gaze.is_empty());
        assert_eq!(trial.button_press_time, None);
    }
}
