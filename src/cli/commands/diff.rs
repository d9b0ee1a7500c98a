//! Diff command - Align annotators and list configuration sets

use clap::{Parser, ValueEnum};
use serde_json::json;

use super::super::output::{color, status_color, write_output};
use super::super::parser::OutputFormat;
use super::{load_config, load_documents};
use crate::diff::{ConfigurationSet, DiffResult};

/// Align annotators and show configuration sets
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Annotator documents (one JSON file per annotator)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Layer config (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Layers to diff (default: all configured layers)
    #[arg(short, long, value_name = "LAYER")]
    pub layer: Vec<String>,

    /// Which sets to show
    #[arg(long, value_enum, default_value = "all")]
    pub only: SetFilter,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Output file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,
}

/// Configuration set filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SetFilter {
    /// Every set
    All,
    /// Sets with more than one configuration
    Differing,
    /// Sets missing an annotator
    Incomplete,
    /// Sets with stacked entries
    Stacked,
}

impl SetFilter {
    fn keep(&self, result: &DiffResult, set: &ConfigurationSet) -> bool {
        match self {
            SetFilter::All => true,
            SetFilter::Differing => set.is_differing(),
            SetFilter::Incomplete => !result.is_complete(set),
            SetFilter::Stacked => set.is_stacked(),
        }
    }
}

fn status(result: &DiffResult, set: &ConfigurationSet) -> &'static str {
    if !result.is_complete(set) {
        "incomplete"
    } else if set.is_stacked() {
        "stacked"
    } else if set.is_differing() {
        "differ"
    } else {
        "agree"
    }
}

fn describe_values(values: &crate::diff::FeatureValues) -> String {
    if values.len() == 1 {
        if let Some(v) = values.values().next() {
            return v.to_string();
        }
    }
    values
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_human(result: &DiffResult, sets: &[&ConfigurationSet]) -> String {
    let mut out = String::new();
    for set in sets {
        let st = status(result, set);
        let configs = set
            .configurations()
            .iter()
            .map(|c| {
                format!(
                    "{{{}: {}}}",
                    describe_values(&c.values),
                    c.annotators().collect::<Vec<_>>().join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{:<28} {:<10} {}\n",
            set.position().to_string(),
            color(status_color(st), st),
            configs
        ));
    }

    let s = result.summary();
    out.push_str(&format!(
        "\n{} sets: {} agreeing, {} differing, {} incomplete ({} stacked)\n",
        s.total,
        color("32", &s.complete_agreeing.to_string()),
        color("1;31", &s.complete_differing.to_string()),
        color("33", &s.incomplete.to_string()),
        s.stacked
    ));
    out
}

fn render_json(result: &DiffResult, sets: &[&ConfigurationSet]) -> Result<String, String> {
    let sets: Vec<serde_json::Value> = sets
        .iter()
        .map(|set| {
            json!({
                "position": set.position(),
                "status": status(result, set),
                "annotators": set.annotators(),
                "stacked": set.stacked_annotators(),
                "configurations": set.configurations(),
            })
        })
        .collect();
    let report = json!({
        "annotators": result.annotators(),
        "layers": result.layers(),
        "summary": result.summary(),
        "sets": sets,
    });
    serde_json::to_string_pretty(&report)
        .map(|s| s + "\n")
        .map_err(|e| format!("Failed to serialize report: {}", e))
}

pub fn run(args: DiffArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let differ = config.differ().map_err(|e| e.to_string())?;
    let documents = load_documents(&args.files)?;
    let refs: Vec<_> = documents.iter().collect();

    let result = if args.layer.is_empty() {
        differ.diff_all(&refs)
    } else {
        let layers: Vec<&str> = args.layer.iter().map(String::as_str).collect();
        differ.diff(&layers, &refs)
    }
    .map_err(|e| e.to_string())?;

    let sets: Vec<&ConfigurationSet> = result
        .configuration_sets()
        .filter(|s| args.only.keep(&result, s))
        .collect();

    let content = match args.format {
        OutputFormat::Human => render_human(&result, &sets),
        OutputFormat::Json => render_json(&result, &sets)?,
    };
    write_output(&content, args.output.as_deref())
}
