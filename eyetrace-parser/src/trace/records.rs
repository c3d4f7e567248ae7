//! Trial records
//!
//! The value types produced by a parse. A [`Trial`] is the unit of output: it
//! owns every fixation, saccade, blink and gaze sample read between its
//! `TRIAL_START` and `TRIAL_END` messages, plus the scalar fields set by
//! messages and trial variables.
//!
//! Times are seconds (the trace stores milliseconds). Coordinates are raw
//! device pixels.
//!
//! | Record     | Produced by                         |
//! |------------|-------------------------------------|
//! | Fixation   | `EFIX` (the `SFIX` opener is state) |
//! | Saccade    | `ESACC`                             |
//! | Blink      | `EBLINK`                            |
//! | GazeSample | numeric sample line ending in `...` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixation interval reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    pub start: f64,
    pub stop: f64,
    pub x: f64,
    pub y: f64,
}

/// A saccade interval with its start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Saccade {
    pub start: f64,
    pub stop: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub amplitude: f64,
    pub peak_velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blink {
    pub start: f64,
    pub stop: f64,
}

/// The three span types the device brackets with `S*`/`E*` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Fixation,
    Saccade,
    Blink,
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanKind::Fixation => write!(f, "fixation"),
            SpanKind::Saccade => write!(f, "saccade"),
            SpanKind::Blink => write!(f, "blink"),
        }
    }
}

/// Which span a gaze sample was read under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanLabel {
    #[default]
    None,
    Fixation,
    Saccade,
    Blink,
}

impl From<SpanKind> for SpanLabel {
    fn from(kind: SpanKind) -> Self {
        match kind {
            SpanKind::Fixation => SpanLabel::Fixation,
            SpanKind::Saccade => SpanLabel::Saccade,
            SpanKind::Blink => SpanLabel::Blink,
        }
    }
}

/// One raw eye-position reading, tagged with the span flags that were set
/// when the line was read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub in_fixation: bool,
    pub in_saccade: bool,
    pub in_blink: bool,
    pub event: SpanLabel,
}

/// A sealed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Set by the `trial_index` trial variable, if the trace carries one.
    pub index: Option<i64>,
    pub start_time: f64,
    pub end_time: f64,
    pub gaze: Vec<GazeSample>,
    pub fixations: Vec<Fixation>,
    pub saccades: Vec<Saccade>,
    pub blinks: Vec<Blink>,
    /// The `rt` trial variable. Already in seconds on the wire.
    pub response_time: Option<f64>,
    pub scene_name: Option<String>,
    pub button_press_time: Option<f64>,
    pub stimulus_onset_time: Option<f64>,
}

impl Trial {
    /// An empty trial opened at `start_time`. The end time is provisional
    /// until the trial is sealed.
    pub fn open(start_time: f64) -> Self {
        Self {
            index: None,
            start_time,
            end_time: start_time,
            gaze: Vec::new(),
            fixations: Vec::new(),
            saccades: Vec::new(),
            blinks: Vec::new(),
            response_time: None,
            scene_name: None,
            button_press_time: None,
            stimulus_onset_time: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Every timestamp in the trial that falls outside `[start_time, end_time]`.
    ///
    /// The parser never clips records; the producer is trusted to keep them
    /// inside the trial window, and this is how callers check that it did.
    /// An end time before the start time is reported as a single
    /// [`RecordKind::TrialEnd`] violation.
    pub fn bounds_violations(&self) -> Vec<BoundsViolation> {
        let mut violations = Vec::new();
        if self.end_time < self.start_time {
            violations.push(BoundsViolation::new(RecordKind::TrialEnd, self.end_time));
            return violations;
        }

        let mut check = |kind: RecordKind, time: f64| {
            if !self.contains(time) {
                violations.push(BoundsViolation::new(kind, time));
            }
        };

        for sample in &self.gaze {
            check(RecordKind::GazeSample, sample.time);
        }
        for fixation in &self.fixations {
            check(RecordKind::Fixation, fixation.start);
            check(RecordKind::Fixation, fixation.stop);
        }
        for saccade in &self.saccades {
            check(RecordKind::Saccade, saccade.start);
            check(RecordKind::Saccade, saccade.stop);
        }
        for blink in &self.blinks {
            check(RecordKind::Blink, blink.start);
            check(RecordKind::Blink, blink.stop);
        }
        if let Some(time) = self.button_press_time {
            check(RecordKind::ButtonPress, time);
        }
        if let Some(time) = self.stimulus_onset_time {
            check(RecordKind::StimulusOnset, time);
        }
        violations
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    GazeSample,
    Fixation,
    Saccade,
    Blink,
    ButtonPress,
    StimulusOnset,
    TrialEnd,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::GazeSample => "gaze sample",
            RecordKind::Fixation => "fixation",
            RecordKind::Saccade => "saccade",
            RecordKind::Blink => "blink",
            RecordKind::ButtonPress => "button press",
            RecordKind::StimulusOnset => "stimulus onset",
            RecordKind::TrialEnd => "trial end",
        };
        f.write_str(name)
    }
}

/// A timestamp found outside its trial's window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsViolation {
    pub record: RecordKind,
    pub time: f64,
}

impl BoundsViolation {
    pub fn new(record: RecordKind, time: f64) -> Self {
        Self { record, time }
    }
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}s is outside the trial window", self.record, self.time)
    }
}
