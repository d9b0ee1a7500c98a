//! CLI argument parsing and structure definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use super::commands::{AgreementArgs, ConfigArgs, DiffArgs, ValidateArgs};

/// Annotation diff and inter-annotator agreement
#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(
    author,
    version,
    about = "Annotation diff and inter-annotator agreement",
    long_about = r#"
concord - compare several annotators' annotations of the same document

Each input file is one annotator's version of a document (JSON). Layers and
the features compared on them come from a TOML config (-c, or the default
config file, see `concord config path`).

EXAMPLES:
  concord diff -c layers.toml alice.json bob.json
  concord diff -c layers.toml --only differing --format json *.json
  concord agreement -c layers.toml --layer pos --feature PosValue alice.json bob.json
  concord agreement -c layers.toml --measure fleiss a.json b.json c.json
  concord validate -c layers.toml *.json
  concord config init
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v`/`--quiet`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align annotators and show configuration sets
    #[command(visible_alias = "d")]
    Diff(DiffArgs),

    /// Compute inter-annotator agreement
    #[command(visible_alias = "a")]
    Agreement(AgreementArgs),

    /// Check documents against the configured layers
    #[command(visible_alias = "v")]
    Validate(ValidateArgs),

    /// Config file management
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output (default)
    #[default]
    Human,
    /// JSON object
    Json,
}
