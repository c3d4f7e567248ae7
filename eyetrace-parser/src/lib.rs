//! # eyetrace-parser
//!
//! A single-pass parser for the `.asc` text traces exported from EyeLink
//! recordings. It cuts a trace into trials at the `TRIAL_START`/`TRIAL_END`
//! messages and collects, per trial, the fixations, saccades, blinks and gaze
//! samples the device reported, plus the variables the experiment emitted.
//!
//! File Layout
//!
//! src/trace
//!   ├── classification   Line grammar: one line → one record shape
//!   ├── builders         Captured fields → records, ms → s
//!   ├── spans            Open/closed state of fixation, saccade, blink
//!   ├── accumulator      Trial boundary state machine
//!   ├── parser           Lazy trial stream over a reader
//!   ├── loader           File / string entry points
//!   └── testing          Sample traces, trace builder, trial assertions
//!
//! For testing guidelines, see the [testing module](trace::testing).

pub mod trace;
