//! Record Builders
//!
//! Pure conversions from the text fields captured by the classifier to the
//! value records in [`records`](super::records). Builders own the unit
//! handling: device timestamps are milliseconds and come out as seconds,
//! coordinates stay in device pixels, and the `rt` trial variable (already
//! seconds on the wire) is taken verbatim.
//!
//! A field that does not parse is a [`FieldError`]. Builders never skip or
//! coerce a bad field.

use super::error::FieldError;
use super::records::{Blink, Fixation, GazeSample, Saccade};
use super::spans::SpanTracker;

const MS_PER_SECOND: f64 = 1000.0;

/// Field names after the eye letter of an `EFIX` line.
const FIXATION_FIELDS: [&str; 6] = ["start", "stop", "duration", "x", "y", "pupil"];

/// Field names after the eye letter of an `ESACC` line.
const SACCADE_FIELDS: [&str; 9] = [
    "start",
    "stop",
    "duration",
    "start_x",
    "start_y",
    "end_x",
    "end_y",
    "amplitude",
    "peak_velocity",
];

/// Field names after the eye letter of an `EBLINK` line.
const BLINK_FIELDS: [&str; 3] = ["start", "stop", "duration"];

pub fn ms_to_seconds(ms: f64) -> f64 {
    ms / MS_PER_SECOND
}

/// Parse a finite number. `nan` and `inf` are rejected even though `f64`'s
/// parser accepts them.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, FieldError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FieldError::new(field, raw)),
    }
}

/// Parse a millisecond timestamp into seconds.
pub fn timestamp(field: &'static str, raw: &str) -> Result<f64, FieldError> {
    parse_number(field, raw).map(ms_to_seconds)
}

/// Parse the leading whitespace-separated fields of `fields` as numbers.
/// Trailing extra columns are left alone.
fn numeric_fields<const N: usize>(
    fields: &str,
    names: [&'static str; N],
) -> Result<[f64; N], FieldError> {
    let mut values = [0.0; N];
    let mut parts = fields.split_whitespace();
    for (slot, name) in values.iter_mut().zip(names) {
        let raw = parts.next().ok_or_else(|| FieldError::missing(name))?;
        *slot = parse_number(name, raw)?;
    }
    Ok(values)
}

/// Build a [`Fixation`] from the fields of an `EFIX` line.
pub fn fixation(fields: &str) -> Result<Fixation, FieldError> {
    let [start, stop, _duration, x, y, _pupil] = numeric_fields(fields, FIXATION_FIELDS)?;
    Ok(Fixation {
        start: ms_to_seconds(start),
        stop: ms_to_seconds(stop),
        x,
        y,
    })
}

/// Build a [`Saccade`] from the fields of an `ESACC` line.
pub fn saccade(fields: &str) -> Result<Saccade, FieldError> {
    let [start, stop, _duration, start_x, start_y, end_x, end_y, amplitude, peak_velocity] =
        numeric_fields(fields, SACCADE_FIELDS)?;
    Ok(Saccade {
        start: ms_to_seconds(start),
        stop: ms_to_seconds(stop),
        start_x,
        start_y,
        end_x,
        end_y,
        amplitude,
        peak_velocity,
    })
}

/// Build a [`Blink`] from the fields of an `EBLINK` line.
pub fn blink(fields: &str) -> Result<Blink, FieldError> {
    let [start, stop, _duration] = numeric_fields(fields, BLINK_FIELDS)?;
    Ok(Blink {
        start: ms_to_seconds(start),
        stop: ms_to_seconds(stop),
    })
}

/// A gaze sample line before it is tagged with span state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub pupil: f64,
}

pub fn raw_sample(time: &str, x: &str, y: &str, pupil: &str) -> Result<RawSample, FieldError> {
    Ok(RawSample {
        time: timestamp("time", time)?,
        x: parse_number("x", x)?,
        y: parse_number("y", y)?,
        pupil: parse_number("pupil", pupil)?,
    })
}

/// Tag a raw sample with the tracker's state at the moment it was read.
pub fn gaze_sample(raw: RawSample, spans: &SpanTracker) -> GazeSample {
    GazeSample {
        time: raw.time,
        x: raw.x,
        y: raw.y,
        in_fixation: spans.in_fixation(),
        in_saccade: spans.in_saccade(),
        in_blink: spans.in_blink(),
        event: spans.label(),
    }
}

/// A `!V TRIAL_VAR <key> <value>` annotation, interpreted by key.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialVariable {
    /// `rt`, in seconds.
    ResponseTime(f64),
    SceneName(String),
    TrialIndex(i64),
    /// Any key the parser has no field for.
    Other { key: String, value: String },
}

/// Build a [`TrialVariable`] from the text after `TRIAL_VAR`: a key, then a
/// value running to the end of the line.
pub fn trial_variable(fields: &str) -> Result<TrialVariable, FieldError> {
    let fields = fields.trim();
    let (key, value) = fields
        .split_once(char::is_whitespace)
        .map(|(key, value)| (key, value.trim_start()))
        .unwrap_or((fields, ""));
    if key.is_empty() {
        return Err(FieldError::missing("key"));
    }
    if value.is_empty() {
        return Err(FieldError::missing("value"));
    }
    interpret_variable(key, value)
}

fn interpret_variable(key: &str, value: &str) -> Result<TrialVariable, FieldError> {
    match key {
        "rt" => parse_number("rt", value).map(TrialVariable::ResponseTime),
        "scene_name" => Ok(TrialVariable::SceneName(value.to_string())),
        "trial_index" => value
            .parse::<i64>()
            .map(TrialVariable::TrialIndex)
            .map_err(|_| FieldError::new("trial_index", value)),
        _ => Ok(TrialVariable::Other {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::records::{SpanKind, SpanLabel};

    #[test]
    fn test_fixation_converts_times_and_keeps_pixels() {
        let fix = fixation("1060 1200 140 605.0 405.0 1150").unwrap();
        assert_eq!(
            fix,
            Fixation {
                start: 1.06,
                stop: 1.2,
                x: 605.0,
                y: 405.0
            }
        );
    }

    #[test]
    fn test_fixation_rejects_non_numeric_field() {
        let err = fixation("abc 1200 140 605.0 405.0 1150").unwrap_err();
        assert_eq!(err, FieldError::new("start", "abc"));
    }

    #[test]
    fn test_fixation_rejects_missing_field() {
        let err = fixation("1060 1200 140 605.0").unwrap_err();
        assert_eq!(err, FieldError::missing("y"));
    }

    #[test]
    fn test_saccade_fields_in_order() {
        let sac = saccade("344176 344200 25 973.7 575.1 965.6 440.6 2.29 134").unwrap();
        assert_eq!(sac.start, 344.176);
        assert_eq!(sac.stop, 344.2);
        assert_eq!(sac.start_x, 973.7);
        assert_eq!(sac.start_y, 575.1);
        assert_eq!(sac.end_x, 965.6);
        assert_eq!(sac.end_y, 440.6);
        assert_eq!(sac.amplitude, 2.29);
        assert_eq!(sac.peak_velocity, 134.0);
    }

    #[test]
    fn test_saccade_with_missing_position_is_an_error() {
        let err = saccade("344176 344200 25 . . 965.6 440.6 2.29 134").unwrap_err();
        assert_eq!(err.field, "start_x");
    }

    #[test]
    fn test_blink_ignores_trailing_columns() {
        let b = blink("2000 2100 100 extra").unwrap();
        assert_eq!(b, Blink { start: 2.0, stop: 2.1 });
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert!(parse_number("x", "nan").is_err());
        assert!(parse_number("x", "inf").is_err());
        assert_eq!(parse_number("x", "-3.5").unwrap(), -3.5);
    }

    #[test]
    fn test_rt_is_not_rescaled() {
        assert_eq!(
            trial_variable("rt 0.450").unwrap(),
            TrialVariable::ResponseTime(0.45)
        );
    }

    #[test]
    fn test_trial_index_must_be_an_integer() {
        assert_eq!(
            trial_variable("trial_index 12").unwrap(),
            TrialVariable::TrialIndex(12)
        );
        assert_eq!(
            trial_variable("trial_index 1.5").unwrap_err(),
            FieldError::new("trial_index", "1.5")
        );
    }

    #[test]
    fn test_unknown_variable_is_kept_raw() {
        assert_eq!(
            trial_variable("block_index 3").unwrap(),
            TrialVariable::Other {
                key: "block_index".to_string(),
                value: "3".to_string()
            }
        );
    }

    #[test]
    fn test_variable_value_keeps_inner_spaces() {
        assert_eq!(
            trial_variable("  scene_name\tkitchen scene 02 ").unwrap(),
            TrialVariable::SceneName("kitchen scene 02".to_string())
        );
    }

    #[test]
    fn test_variable_without_value_is_an_error() {
        assert_eq!(trial_variable(" rt").unwrap_err(), FieldError::missing("value"));
    }

    #[test]
    fn test_variable_without_key_is_an_error() {
        assert_eq!(trial_variable("   ").unwrap_err(), FieldError::missing("key"));
    }

    #[test]
    fn test_gaze_sample_snapshots_tracker() {
        let mut spans = SpanTracker::new();
        spans.open(SpanKind::Fixation);
        let raw = raw_sample("614000.0", "600.0", "400.0", "1200.0").unwrap();
        let sample = gaze_sample(raw, &spans);
        assert_eq!(sample.time, 614.0);
        assert!(sample.in_fixation);
        assert!(!sample.in_saccade);
        assert!(!sample.in_blink);
        assert_eq!(sample.event, SpanLabel::Fixation);
    }
}
