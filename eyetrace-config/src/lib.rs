//! Shared configuration loader for the eyetrace tools.
//!
//! `defaults/eyetrace.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! and command-line overrides on top of those defaults via [`Loader`] before
//! deserializing into [`EyetraceConfig`].
//!
//! Layers, lowest first:
//!
//!   1. the embedded defaults
//!   2. the per-user file, `$XDG_CONFIG_HOME/eyetrace/config.toml`
//!      (`~/.config/eyetrace/config.toml` when `XDG_CONFIG_HOME` is unset), if present
//!   3. an explicit file (`--config`), which must exist
//!   4. single-key overrides from command-line flags

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/eyetrace.default.toml");

/// Top-level configuration consumed by eyetrace applications.
#[derive(Debug, Clone, Deserialize)]
pub struct EyetraceConfig {
    pub parse: ParseConfig,
    pub output: OutputConfig,
    pub validate: ValidateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    /// Keep sealed trials when the trace ends inside a trial.
    pub allow_incomplete: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub include_gaze: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// A single JSON array on one line.
    Json,
    /// A single indented JSON array.
    JsonPretty,
    /// One JSON object per trial, written as each trial seals.
    Jsonl,
    Yaml,
}

impl OutputFormat {
    pub const ALL: &'static [&'static str] = &["json", "json-pretty", "jsonl", "yaml"];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateConfig {
    pub check_bounds: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// A `tracing` filter directive such as `info` or `eyetrace_parser=debug`.
    pub level: String,
}

/// Layers configuration sources over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start from the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.with_toml(path.as_ref(), true)
    }

    /// Layer a TOML file, skipped when absent.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.with_toml(path.as_ref(), false)
    }

    /// Layer the per-user file from [`user_config_path`], when one can be located.
    pub fn with_user_file(self) -> Self {
        match user_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        }
    }

    fn with_toml(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, e.g. `output.format`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<EyetraceConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the per-user config file lives, from the current environment.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_path_from(env::var_os("XDG_CONFIG_HOME"), env::var_os("HOME"))
}

fn user_config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match xdg_config_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(home.filter(|dir| !dir.is_empty())?).join(".config"),
    };
    Some(base.join("eyetrace").join("config.toml"))
}
