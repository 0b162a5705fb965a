//! metalp command line
//!
//! Option parsing, logging setup and dispatch to the pipeline. Extensions
//! add their own options to the command before arguments are parsed.

use std::ffi::OsString;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use metalp_extension::Extension;
use metalp_pipeline::{Pipeline, PipelineConfig, PipelineError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "metalp", version, about = "Reify logic programs with provenance tags")]
pub struct Cli {
    /// Program files, in order. The program is read from stdin when none are given.
    pub files: Vec<PathBuf>,

    /// Constant definition `name=value`, overriding `#const` defaults.
    #[arg(short = 'c', long = "const", value_name = "NAME=VALUE")]
    pub constants: Vec<String>,

    /// Print only the facts selected by the visibility encodings (default).
    #[arg(long, overrides_with = "no_clean")]
    pub clean: bool,

    /// Print every atom of the filtered answer.
    #[arg(long = "no-clean", overrides_with = "clean")]
    pub no_clean: bool,

    /// Plain reification, without extensions or filtering.
    #[arg(long)]
    pub classic: bool,

    /// Directory for the full and clean reification dumps.
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    /// Directory whose `<name>.lp` files replace the builtin encodings.
    #[arg(long, value_name = "DIR")]
    pub encodings_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `metalp_pipeline=debug`.
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    pub log: String,
}

impl Cli {
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new()
            .with_constants(self.constants.iter().cloned())
            .with_clean_output(!self.no_clean);
        if let Some(dir) = &self.dump_dir {
            config = config.with_dump_dir(dir);
        }
        if let Some(dir) = &self.encodings_dir {
            config = config.with_encodings_dir(dir);
        }
        config
    }
}

/// Parse `args` with the options of every extension registered.
pub fn parse_args<I, T>(extensions: &[Box<dyn Extension>], args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    for extension in extensions {
        command = extension.register_options(command);
    }
    let matches = command.try_get_matches_from(args)?;
    Cli::from_arg_matches(&matches)
}

/// Install the stderr log subscriber.
pub fn init_logging(filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(filter).map_err(|e| anyhow!("invalid log filter '{}': {}", filter, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .map_err(|e| anyhow!("cannot install logger: {}", e))
}

/// Run the pipeline selected by `cli`. `stdin` is read only when no files
/// are given.
pub fn run(cli: &Cli, extensions: Vec<Box<dyn Extension>>, mut stdin: impl Read) -> Result<String> {
    let inline = if cli.files.is_empty() {
        let mut text = String::new();
        stdin
            .read_to_string(&mut text)
            .context("cannot read standard input")?;
        Some(text)
    } else {
        None
    };
    debug!(files = cli.files.len(), classic = cli.classic, "starting");

    let pipeline = Pipeline::with_extensions(cli.config(), extensions);
    let output = if cli.classic {
        pipeline.classic(&cli.files, inline.as_deref())?
    } else {
        pipeline.run(&cli.files, inline.as_deref())?
    };
    Ok(output)
}

/// Taxonomy name of an error, for the `error[<kind>]` prefix.
pub fn error_kind(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<PipelineError>() {
        Some(e) => e.kind().name(),
        None => "IoError",
    }
}
