//! Trial assertions

use crate::trace::records::{Fixation, Saccade, Trial};

/// Tolerance for comparing times and coordinates
pub const EPSILON: f64 = 1e-9;

fn assert_close(actual: f64, expected: f64, what: &str, context: &str) {
    assert!(
        (actual - expected).abs() <= EPSILON,
        "{}: Expected {} = {}, found {}",
        context,
        what,
        expected,
        actual
    );
}

fn assert_close_opt(actual: Option<f64>, expected: Option<f64>, what: &str, context: &str) {
    match (actual, expected) {
        (Some(a), Some(e)) => assert_close(a, e, what, context),
        (None, None) => {}
        _ => panic!(
            "{}: Expected {} = {:?}, found {:?}",
            context, what, expected, actual
        ),
    }
}

/// Start a fluent assertion chain on a trial.
pub fn assert_trial(trial: &Trial) -> TrialAssertion<'_> {
    TrialAssertion {
        trial,
        context: format!("trial starting at {}s", trial.start_time),
    }
}

pub struct TrialAssertion<'a> {
    trial: &'a Trial,
    context: String,
}

impl<'a> TrialAssertion<'a> {
    pub fn start_time(self, expected: f64) -> Self {
        assert_close(self.trial.start_time, expected, "start_time", &self.context);
        self
    }

    pub fn end_time(self, expected: f64) -> Self {
        assert_close(self.trial.end_time, expected, "end_time", &self.context);
        self
    }

    pub fn index(self, expected: Option<i64>) -> Self {
        assert_eq!(
            self.trial.index, expected,
            "{}: Expected index {:?}, found {:?}",
            self.context, expected, self.trial.index
        );
        self
    }

    pub fn response_time(self, expected: Option<f64>) -> Self {
        assert_close_opt(self.trial.response_time, expected, "response_time", &self.context);
        self
    }

    pub fn button_press_time(self, expected: Option<f64>) -> Self {
        assert_close_opt(
            self.trial.button_press_time,
            expected,
            "button_press_time",
            &self.context,
        );
        self
    }

    pub fn stimulus_onset_time(self, expected: Option<f64>) -> Self {
        assert_close_opt(
            self.trial.stimulus_onset_time,
            expected,
            "stimulus_onset_time",
            &self.context,
        );
        self
    }

    pub fn scene_name(self, expected: Option<&str>) -> Self {
        assert_eq!(
            self.trial.scene_name.as_deref(),
            expected,
            "{}: Expected scene_name {:?}, found {:?}",
            self.context,
            expected,
            self.trial.scene_name
        );
        self
    }

    pub fn gaze_count(self, expected: usize) -> Self {
        let actual = self.trial.gaze.len();
        self.count("gaze samples", actual, expected)
    }

    pub fn fixation_count(self, expected: usize) -> Self {
        let actual = self.trial.fixations.len();
        self.count("fixations", actual, expected)
    }

    pub fn saccade_count(self, expected: usize) -> Self {
        let actual = self.trial.saccades.len();
        self.count("saccades", actual, expected)
    }

    pub fn blink_count(self, expected: usize) -> Self {
        let actual = self.trial.blinks.len();
        self.count("blinks", actual, expected)
    }

    /// Compare fixation `index` against `(start, stop, x, y)`.
    pub fn fixation(self, index: usize, expected: (f64, f64, f64, f64)) -> Self {
        let Fixation { start, stop, x, y } = *self.fixation_at(index);
        let context = format!("{} fixation #{}", self.context, index);
        assert_close(start, expected.0, "start", &context);
        assert_close(stop, expected.1, "stop", &context);
        assert_close(x, expected.2, "x", &context);
        assert_close(y, expected.3, "y", &context);
        self
    }

    /// Run custom checks on saccade `index`.
    pub fn saccade<F>(self, index: usize, check: F) -> Self
    where
        F: FnOnce(&Saccade),
    {
        let saccade = self.trial.saccades.get(index).unwrap_or_else(|| {
            panic!(
                "{}: Expected saccade #{}, trial has {}",
                self.context,
                index,
                self.trial.saccades.len()
            )
        });
        check(saccade);
        self
    }

    /// The `in_fixation`/`in_saccade`/`in_blink` flags of every gaze sample, in order.
    pub fn gaze_flags(self, expected: &[(bool, bool, bool)]) -> Self {
        let actual: Vec<_> = self
            .trial
            .gaze
            .iter()
            .map(|s| (s.in_fixation, s.in_saccade, s.in_blink))
            .collect();
        assert_eq!(
            actual, expected,
            "{}: gaze sample flags differ",
            self.context
        );
        self
    }

    /// No record falls outside the trial window.
    pub fn within_bounds(self) -> Self {
        let violations = self.trial.bounds_violations();
        assert!(
            violations.is_empty(),
            "{}: records outside the trial window: {:?}",
            self.context,
            violations
        );
        self
    }

    fn fixation_at(&self, index: usize) -> &'a Fixation {
        self.trial.fixations.get(index).unwrap_or_else(|| {
            panic!(
                "{}: Expected fixation #{}, trial has {}",
                self.context,
                index,
                self.trial.fixations.len()
            )
        })
    }

    fn count(self, what: &str, actual: usize, expected: usize) -> Self {
        assert_eq!(
            actual, expected,
            "{}: Expected {} {}, found {}",
            self.context, expected, what, actual
        );
        self
    }
}
