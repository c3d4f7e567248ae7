//! Trial writers
//!
//! Each output format is a [`TrialSink`]. `jsonl` writes a line as each
//! trial arrives, so it stays streaming end to end; the array formats
//! (`json`, `json-pretty`, `yaml`) buffer the trials and write on `finish`.

use anyhow::{Context, Result};
use eyetrace_config::OutputFormat;
use eyetrace_parser::trace::Trial;
use std::io::Write;

pub trait TrialSink {
    fn push(&mut self, trial: Trial) -> Result<()>;
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Build the sink for `format` over `writer`.
pub fn sink_for<'w>(format: OutputFormat, writer: Box<dyn Write + 'w>) -> Box<dyn TrialSink + 'w> {
    match format {
        OutputFormat::Jsonl => Box::new(JsonLines { writer }),
        OutputFormat::Json => Box::new(Buffered::new(ArrayStyle::Json, writer)),
        OutputFormat::JsonPretty => Box::new(Buffered::new(ArrayStyle::JsonPretty, writer)),
        OutputFormat::Yaml => Box::new(Buffered::new(ArrayStyle::Yaml, writer)),
    }
}

struct JsonLines<'w> {
    writer: Box<dyn Write + 'w>,
}

impl TrialSink for JsonLines<'_> {
    fn push(&mut self, trial: Trial) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &trial).context("JSON serialization failed")?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ArrayStyle {
    Json,
    JsonPretty,
    Yaml,
}

struct Buffered<'w> {
    style: ArrayStyle,
    writer: Box<dyn Write + 'w>,
    trials: Vec<Trial>,
}

impl<'w> Buffered<'w> {
    fn new(style: ArrayStyle, writer: Box<dyn Write + 'w>) -> Self {
        Self {
            style,
            writer,
            trials: Vec::new(),
        }
    }
}

impl TrialSink for Buffered<'_> {
    fn push(&mut self, trial: Trial) -> Result<()> {
        self.trials.push(trial);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let Buffered {
            style,
            mut writer,
            trials,
        } = *self;
        match style {
            ArrayStyle::Json => {
                serde_json::to_writer(&mut writer, &trials).context("JSON serialization failed")?;
                writer.write_all(b"\n")?;
            }
            ArrayStyle::JsonPretty => {
                serde_json::to_writer_pretty(&mut writer, &trials)
                    .context("JSON serialization failed")?;
                writer.write_all(b"\n")?;
            }
            ArrayStyle::Yaml => {
                serde_yaml::to_writer(&mut writer, &trials).context("YAML serialization failed")?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
