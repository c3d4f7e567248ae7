//! Command-line interface for eyetrace
//! This binary parses an EyeLink `.asc` trace into per-trial records and writes them out as
//! JSON, JSON lines or YAML.
//!
//! Usage:
//!   eyetrace `<trace.asc>` [--format `<format>`] [--output `<file>`]   - Parse a trace
//!   eyetrace `<trace.asc>` --limit 3 --no-gaze                        - First three trials, no samples
//!
//! Settings come from the built-in defaults, then the per-user file
//! (`$XDG_CONFIG_HOME/eyetrace/config.toml`), then `--config <file>`, then the flags above.

mod output;

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use eyetrace_config::{EyetraceConfig, Loader, OutputFormat};
use eyetrace_parser::trace::{TraceError, TraceLoader};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("eyetrace")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse EyeLink .asc traces into per-trial records")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the .asc trace")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default from config: json-pretty)")
                .value_parser(PossibleValuesParser::new(OutputFormat::ALL.iter().copied())),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write to this file instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .help("Stop after this many trials")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("no-gaze")
                .long("no-gaze")
                .help("Drop gaze samples from the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("allow-incomplete")
                .long("allow-incomplete")
                .help("Keep the closed trials when the trace ends inside a trial")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file layered over the defaults")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-user-config")
                .long("no-user-config")
                .help("Ignore the per-user config file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log filter, e.g. 'debug' or 'eyetrace_parser=trace' (RUST_LOG wins)"),
        )
}

fn main() {
    let matches = cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

/// Defaults, then the user file, then `--config`, then command-line flags.
fn load_config(matches: &ArgMatches) -> Result<EyetraceConfig> {
    let mut loader = Loader::new();
    if !matches.get_flag("no-user-config") {
        loader = loader.with_user_file();
    }
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    if matches.get_flag("no-gaze") {
        loader = loader.set_override("output.include_gaze", false)?;
    }
    if matches.get_flag("allow-incomplete") {
        loader = loader.set_override("parse.allow_incomplete", true)?;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        loader = loader.set_override("logging.level", level.as_str())?;
    }
    loader.build().context("invalid configuration")
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    init_logging(&config.logging.level);

    let path = matches
        .get_one::<PathBuf>("path")
        .expect("path is a required argument");
    let limit = matches
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(usize::MAX);

    let mut trials = TraceLoader::from_path(path)?.trials();
    let mut sink = output::sink_for(
        config.output.format,
        open_output(matches.get_one::<PathBuf>("output"))?,
    );

    let mut written = 0usize;
    for result in trials.by_ref().take(limit) {
        let mut trial = match result {
            Ok(trial) => trial,
            Err(err @ TraceError::IncompleteTrial { .. }) if config.parse.allow_incomplete => {
                warn!("{err}; keeping the {written} trial(s) that closed");
                break;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to parse {}", path.display()))
            }
        };

        if config.validate.check_bounds {
            for violation in trial.bounds_violations() {
                warn!(trial = written, "{violation}");
            }
        }
        if !config.output.include_gaze {
            trial.gaze = Vec::new();
        }
        sink.push(trial)?;
        written += 1;
    }
    sink.finish()?;

    let stats = trials.stats();
    info!(
        trials = written,
        lines = stats.lines,
        unrecognized = stats.unrecognized,
        outside_trial = stats.outside_trial,
        "parsed {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let config = load_config(&matches(&[
            "eyetrace",
            "trace.asc",
            "--format",
            "yaml",
            "--no-gaze",
            "--allow-incomplete",
            "--no-user-config",
        ]))
        .unwrap();
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert!(!config.output.include_gaze);
        assert!(config.parse.allow_incomplete);
    }

    #[test]
    fn defaults_without_flags() {
        let config = load_config(&matches(&["eyetrace", "trace.asc", "--no-user-config"])).unwrap();
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        assert!(config.output.include_gaze);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["eyetrace", "trace.asc", "--format", "csv"])
            .is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }
}
