//! Fluent trace writer for tests
//!
//! Times passed to the builder are device milliseconds, exactly as they
//! appear in the trace text.

use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct TraceBuilder {
    text: String,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw line.
    pub fn line(mut self, line: &str) -> Self {
        self.text.push_str(line);
        self.text.push('\n');
        self
    }

    /// The header lines `edf2asc` writes before any data.
    pub fn header(self) -> Self {
        self.line("** CONVERTED FROM raw.edf using edfapi 4.2.1 Jan 19 2022")
            .line("** TYPE: EDF_FILE BINARY EVENT SAMPLE TAGGED")
            .line("**")
            .line("MSG 0 DISPLAY_COORDS 0 0 1919 1079")
            .line("START\t0 \tRIGHT\tSAMPLES\tEVENTS")
            .line("PRESCALER\t1")
    }

    pub fn message(self, time: u64, text: &str) -> Self {
        self.line(&format!("MSG {time} {text}"))
    }

    pub fn trial_start(self, time: u64) -> Self {
        self.message(time, "TRIAL_START")
    }

    pub fn trial_end(self, time: u64) -> Self {
        self.message(time, "TRIAL_END")
    }

    pub fn button_press(self, time: u64) -> Self {
        self.message(time, "BUTTON_PRESS")
    }

    pub fn stimulus_onset(self, time: u64) -> Self {
        self.message(time, "VIDEO_STIM_ONSET")
    }

    pub fn variable(self, time: u64, key: &str, value: &str) -> Self {
        self.message(time, &format!("!V TRIAL_VAR {key} {value}"))
    }

    pub fn start_fixation(self) -> Self {
        self.line("SFIX R")
    }

    pub fn end_fixation(self, start: u64, stop: u64, x: f64, y: f64) -> Self {
        let duration = stop.saturating_sub(start);
        self.line(&format!("EFIX R {start} {stop} {duration} {x:.1} {y:.1} 1150"))
    }

    pub fn start_saccade(self) -> Self {
        self.line("SSACC R")
    }

    pub fn end_saccade(self, start: u64, stop: u64, from: (f64, f64), to: (f64, f64)) -> Self {
        let duration = stop.saturating_sub(start);
        self.line(&format!(
            "ESACC R {start} {stop} {duration} {:.1} {:.1} {:.1} {:.1} 2.29 134",
            from.0, from.1, to.0, to.1
        ))
    }

    pub fn start_blink(self) -> Self {
        self.line("SBLINK R")
    }

    pub fn end_blink(self, start: u64, stop: u64) -> Self {
        let duration = stop.saturating_sub(start);
        self.line(&format!("EBLINK R {start} {stop} {duration}"))
    }

    /// A gaze sample line, with the trailing `...` marker.
    pub fn sample(mut self, time: u64, x: f64, y: f64) -> Self {
        let _ = writeln!(self.text, "{time}\t{x:.1}\t{y:.1}\t1183.0\t...");
        self
    }

    pub fn build(self) -> String {
        self.text
    }
}
