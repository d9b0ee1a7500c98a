//! CLI module for the concord binary
//!
//! Argument parsing and command routing. Individual command implementations
//! are in the `commands` submodule.

pub mod commands;
pub mod output;
pub mod parser;

pub use output::*;
pub use parser::*;

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Diff(args) => commands::diff::run(args),
        Commands::Agreement(args) => commands::agreement::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
