//! Event-Span Tracker
//!
//! Mirrors the device's `S*`/`E*` span markers. The three flags are
//! independent: spans may overlap (a blink inside a fixation is common) and
//! the tracker does not enforce any exclusion, it only records what the
//! device reported.
//!
//! The tracker also keeps a single [`SpanLabel`] naming the span a sample
//! belongs to. Opening a span takes the label. Closing the labelled span
//! hands the label to a span that is still open, preferring blink, then
//! saccade, then fixation; closing any other span leaves it alone.

use super::records::{SpanKind, SpanLabel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanTracker {
    fixation: bool,
    saccade: bool,
    blink: bool,
    label: SpanLabel,
}

impl SpanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, kind: SpanKind) {
        *self.flag_mut(kind) = true;
        self.label = kind.into();
    }

    pub fn close(&mut self, kind: SpanKind) {
        *self.flag_mut(kind) = false;
        if self.label == SpanLabel::from(kind) {
            self.label = self.fallback_label();
        }
    }

    pub fn is_open(&self, kind: SpanKind) -> bool {
        match kind {
            SpanKind::Fixation => self.fixation,
            SpanKind::Saccade => self.saccade,
            SpanKind::Blink => self.blink,
        }
    }

    pub fn in_fixation(&self) -> bool {
        self.fixation
    }

    pub fn in_saccade(&self) -> bool {
        self.saccade
    }

    pub fn in_blink(&self) -> bool {
        self.blink
    }

    pub fn label(&self) -> SpanLabel {
        self.label
    }

    /// Back to the initial all-closed state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn flag_mut(&mut self, kind: SpanKind) -> &mut bool {
        match kind {
            SpanKind::Fixation => &mut self.fixation,
            SpanKind::Saccade => &mut self.saccade,
            SpanKind::Blink => &mut self.blink,
        }
    }

    fn fallback_label(&self) -> SpanLabel {
        [SpanKind::Blink, SpanKind::Saccade, SpanKind::Fixation]
            .into_iter()
            .find(|kind| self.is_open(*kind))
            .map_or(SpanLabel::None, SpanLabel::from)
    }
}
