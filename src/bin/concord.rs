//! concord - annotation diff and inter-annotator agreement
//!
//! # Usage
//!
//! ```bash
//! # Configuration sets where annotators disagree
//! concord diff -c layers.toml --only differing alice.json bob.json
//!
//! # Cohen's kappa on POS tags
//! concord agreement -c layers.toml --layer pos --feature PosValue alice.json bob.json
//!
//! # Fleiss' kappa over three annotators
//! concord agreement -c layers.toml --measure fleiss a.json b.json c.json
//!
//! # Check documents before diffing
//! concord validate -c layers.toml *.json
//! ```

use std::process::ExitCode;

use clap::Parser;
use concord::cli::{color, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match concord::cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
