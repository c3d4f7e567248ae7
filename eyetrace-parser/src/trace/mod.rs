//! Main module for trace parsing
//!
//! Line flow through the parser:
//!
//! ```text
//! line ──► classification ──► LineKind ──► accumulator ──► sealed Trial
//!              │                               │
//!              └─► builders (fields → records)  └─► spans (open/close flags)
//! ```

pub mod accumulator;
pub mod builders;
pub mod classification;
pub mod error;
pub mod loader;
pub mod parser;
pub mod records;
pub mod spans;
pub mod testing;

pub use error::{FieldError, TraceError, TraceResult};
pub use loader::TraceLoader;
pub use parser::{parse_reader, parse_str, ParseStats, TraceParser};
pub use records::{
    Blink, BoundsViolation, Fixation, GazeSample, RecordKind, Saccade, SpanKind, SpanLabel, Trial,
};
