//! Testing utilities for trace parsing
//!
//!     Hand-written trace text is easy to get subtly wrong: a missing `...`
//!     marker turns a gaze sample into noise, a missing column turns an `EFIX`
//!     into a format error. Tests therefore get their input from one of two
//!     places:
//!
//!         1. Curated sample traces under `samples/` (via [Samples](samples::Samples)),
//!            shaped like real `edf2asc` output, header and noise lines included.
//!         2. [TraceBuilder](builder::TraceBuilder), which writes well-formed lines
//!            from typed calls, for cases too specific for a sample file.
//!
//!     Results are checked with [assert_trial](fn@assert_trial), which compares
//!     times with a small tolerance and reports which trial failed.
//!
//!     ```rust,ignore
//!     use eyetrace_parser::trace::testing::{assert_trial, samples::Samples};
//!
//!     let trials = Samples::parse("single-trial");
//!     assert_trial(&trials[0])
//!         .start_time(1.0)
//!         .end_time(1.6)
//!         .fixation_count(1)
//!         .within_bounds();
//!     ```

pub mod assertions;
pub mod builder;
pub mod samples;

pub use assertions::{assert_trial, TrialAssertion};
pub use builder::TraceBuilder;
