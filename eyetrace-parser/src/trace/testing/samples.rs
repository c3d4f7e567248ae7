//! Curated sample traces
//!
//! Sample files live in `samples/<name>.asc` at the crate root. Loading
//! helpers panic on failure: they are for tests, where a missing sample is a
//! broken test rather than a condition to handle.

use crate::trace::error::TraceResult;
use crate::trace::loader::TraceLoader;
use crate::trace::records::Trial;
use std::fs;
use std::path::PathBuf;

pub struct Samples;

impl Samples {
    /// Directory holding the sample traces
    pub fn dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("samples")
    }

    pub fn path(name: &str) -> PathBuf {
        Self::dir().join(format!("{name}.asc"))
    }

    /// Names of every sample, sorted.
    pub fn names() -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(Self::dir())
            .unwrap_or_else(|e| panic!("Failed to list samples: {}", e))
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "asc"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    /// Raw text of a sample.
    pub fn source(name: &str) -> String {
        let path = Self::path(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    /// Parse a sample, returning the result untouched.
    pub fn try_parse(name: &str) -> TraceResult<Vec<Trial>> {
        let path = Self::path(name);
        TraceLoader::from_path(&path)
            .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e))
            .parse()
    }

    /// Parse a sample that is expected to be well formed.
    pub fn parse(name: &str) -> Vec<Trial> {
        Self::try_parse(name).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
    }
}
