//! Validate command - Check annotator documents against the layer config

use clap::Parser;

use super::super::output::color;
use super::load_config;
use crate::AnnotatedDocument;

/// Check documents against the configured layers
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Documents to validate
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Layer config (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,
}

pub fn run(args: ValidateArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let adapters = config.adapters().map_err(|e| e.to_string())?;

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &args.files {
        let doc = match AnnotatedDocument::load(file) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("{} {}: {}", color("31", "error"), file, e);
                total_errors += 1;
                continue;
            }
        };

        let mut errors = 0;
        for layer in doc.layers() {
            let Some(adapter) = adapters.get(layer) else {
                eprintln!(
                    "{} {}: layer '{}' is not configured and will not be compared",
                    color("33", "warn"),
                    file,
                    layer
                );
                total_warnings += 1;
                continue;
            };
            for ann in doc.select(layer) {
                if let Err(e) = adapter.position(&doc, ann) {
                    eprintln!("{} {}: {}", color("31", "error"), file, e);
                    errors += 1;
                }
            }
        }

        if errors == 0 {
            println!(
                "{} {} ({}, {} annotations)",
                color("32", "ok"),
                file,
                doc.annotator,
                doc.len()
            );
        }
        total_errors += errors;
    }

    if total_errors > 0 {
        return Err(format!(
            "{} error(s), {} warning(s) in {} file(s)",
            total_errors,
            total_warnings,
            args.files.len()
        ));
    }
    Ok(())
}
