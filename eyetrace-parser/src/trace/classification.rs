//! Line Classification
//!
//! Maps one line of an `.asc` trace to the record shape it carries. The
//! grammar is a table of regex rules tried in declaration order; the first
//! rule that matches decides the shape and hands its captures to a record
//! builder. Lines no rule matches are [`LineKind::Unrecognized`] and are
//! skipped by the parser: vendor firmware writes plenty of lines we have no
//! use for (`START`, `PRESCALER`, `INPUT`, calibration reports, ...).
//!
//! The rule order (it decides correctness, not just speed):
//! 1. span openers `SFIX`, `SSACC`, `SBLINK` (literal prefixes)
//! 2. `MSG <t>` messages, told apart by the keyword after the timestamp
//! 3. span closers `EFIX`, `ESACC`, `EBLINK` (keyword, eye, numeric fields)
//! 4. gaze samples, the loosest shape, which must end in the `...` marker so
//!    that it can never swallow a message line
//!
//! Once a rule matches, a field that fails to parse is an error rather than
//! a fall-through to the next rule.

use super::builders::{self, RawSample, TrialVariable};
use super::error::FieldError;
use super::records::{Blink, Fixation, Saccade};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// The shape of a single trace line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    OpenFixation,
    CloseFixation(Fixation),
    OpenSaccade,
    CloseSaccade(Saccade),
    OpenBlink,
    CloseBlink(Blink),
    /// Trial boundary opener; time in seconds.
    TrialStart(f64),
    /// Trial boundary closer; time in seconds.
    TrialEnd(f64),
    ButtonPress(f64),
    StimulusOnset(f64),
    TrialVariable {
        time: f64,
        variable: TrialVariable,
    },
    GazeSample(RawSample),
    Unrecognized,
}

impl LineKind {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, LineKind::Unrecognized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    OpenFixation,
    OpenSaccade,
    OpenBlink,
    TrialStart,
    TrialEnd,
    ButtonPress,
    StimulusOnset,
    TrialVariable,
    CloseFixation,
    CloseSaccade,
    CloseBlink,
    GazeSample,
}

/// Grammar rules as (rule, regex) pairs.
/// Order matters: rules are tried in declaration order.
const LINE_PATTERNS: &[(Rule, &str)] = &[
    (Rule::OpenFixation, r"^SFIX\b"),
    // EyeLink writes SSACC; SSAC is accepted as well.
    (Rule::OpenSaccade, r"^SSACC?\b"),
    (Rule::OpenBlink, r"^SBLINK\b"),
    // Message rules match the keyword alone; a missing timestamp or
    // argument is then a field error rather than an unrecognized line.
    (
        Rule::TrialStart,
        r"^MSG\s+(?:(?P<time>\S+)\s+)?TRIAL_START\b",
    ),
    (Rule::TrialEnd, r"^MSG\s+(?:(?P<time>\S+)\s+)?TRIAL_END\b"),
    (
        Rule::ButtonPress,
        r"^MSG\s+(?:(?P<time>\S+)\s+)?BUTTON_PRESS\b",
    ),
    (
        Rule::StimulusOnset,
        r"^MSG\s+(?:(?P<time>\S+)\s+)?VIDEO_STIM_ONSET\b",
    ),
    (
        Rule::TrialVariable,
        r"^MSG\s+(?:(?P<time>\S+)\s+)?!V\s+TRIAL_VAR\b(?P<fields>.*)$",
    ),
    (
        Rule::CloseFixation,
        r"^EFIX\b(?:\s+[LR]\b)?(?P<fields>.*)$",
    ),
    (
        Rule::CloseSaccade,
        r"^ESACC\b(?:\s+[LR]\b)?(?P<fields>.*)$",
    ),
    (
        Rule::CloseBlink,
        r"^EBLINK\b(?:\s+[LR]\b)?(?P<fields>.*)$",
    ),
    (
        Rule::GazeSample,
        r"^(?P<time>\d+(?:\.\d+)?)\s+(?P<x>-?\d+(?:\.\d+)?)\s+(?P<y>-?\d+(?:\.\d+)?)\s+(?P<pupil>\d+(?:\.\d+)?)\s.*\.\.\.",
    ),
];

/// Compiled grammar, built once on first use
static LINE_RULES: Lazy<Vec<(Rule, Regex)>> = Lazy::new(|| {
    LINE_PATTERNS
        .iter()
        .map(|(rule, pattern)| (*rule, Regex::new(pattern).unwrap()))
        .collect()
});

/// Classify one line. Line terminators are ignored.
pub fn classify_line(line: &str) -> Result<LineKind, FieldError> {
    let line = line.trim_end_matches(['\r', '\n']);
    for (rule, regex) in LINE_RULES.iter() {
        if let Some(caps) = regex.captures(line) {
            return build(*rule, &caps);
        }
    }
    Ok(LineKind::Unrecognized)
}

fn build(rule: Rule, caps: &Captures<'_>) -> Result<LineKind, FieldError> {
    let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
    let message_time = || match caps.name("time") {
        Some(time) => builders::timestamp("time", time.as_str()),
        None => Err(FieldError::missing("time")),
    };

    let kind = match rule {
        Rule::OpenFixation => LineKind::OpenFixation,
        Rule::OpenSaccade => LineKind::OpenSaccade,
        Rule::OpenBlink => LineKind::OpenBlink,
        Rule::TrialStart => LineKind::TrialStart(message_time()?),
        Rule::TrialEnd => LineKind::TrialEnd(message_time()?),
        Rule::ButtonPress => LineKind::ButtonPress(message_time()?),
        Rule::StimulusOnset => LineKind::StimulusOnset(message_time()?),
        Rule::TrialVariable => LineKind::TrialVariable {
            time: message_time()?,
            variable: builders::trial_variable(group("fields"))?,
        },
        Rule::CloseFixation => LineKind::CloseFixation(builders::fixation(group("fields"))?),
        Rule::CloseSaccade => LineKind::CloseSaccade(builders::saccade(group("fields"))?),
        Rule::CloseBlink => LineKind::CloseBlink(builders::blink(group("fields"))?),
        Rule::GazeSample => LineKind::GazeSample(builders::raw_sample(
            group("time"),
            group("x"),
            group("y"),
            group("pupil"),
        )?),
    };
    Ok(kind)
}
