//! Agreement command - Inter-annotator agreement on one feature

use clap::Parser;
use serde_json::json;

use super::super::output::{coefficient_colored, color, format_coefficient, write_output};
use super::super::parser::OutputFormat;
use super::{load_config, load_documents};
use crate::agreement::{
    agreement, kappa_interpretation, pairwise_agreement, AgreementOptions, AgreementResult,
    Measure, PairwiseAgreement,
};

/// Compute inter-annotator agreement
#[derive(Parser, Debug)]
pub struct AgreementArgs {
    /// Annotator documents (one JSON file per annotator)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Layer config (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Layer to rate (default: from the config's [agreement] table)
    #[arg(short, long, value_name = "LAYER")]
    pub layer: Option<String>,

    /// Feature holding the category (default: from the config)
    #[arg(long, value_name = "FEATURE")]
    pub feature: Option<String>,

    /// Coefficient: cohen, fleiss or percent
    #[arg(short, long, value_name = "MEASURE")]
    pub measure: Option<String>,

    /// Also print the pairwise matrix
    #[arg(long)]
    pub pairwise: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Output file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,
}

fn resolve_options(args: &AgreementArgs, defaults: Option<&AgreementOptions>) -> Result<AgreementOptions, String> {
    let layer = args
        .layer
        .clone()
        .or_else(|| defaults.map(|d| d.layer.clone()))
        .ok_or("--layer is required (no [agreement] defaults in config)")?;
    let feature = args
        .feature
        .clone()
        .or_else(|| defaults.map(|d| d.feature.clone()))
        .ok_or("--feature is required (no [agreement] defaults in config)")?;
    let measure = match &args.measure {
        Some(m) => m.parse::<Measure>().map_err(|e| e.to_string())?,
        None => defaults.map(|d| d.measure).unwrap_or_default(),
    };
    let annotators = defaults.map(|d| d.annotators.clone()).unwrap_or_default();
    Ok(AgreementOptions::new(layer, feature)
        .measure(measure)
        .annotators(annotators))
}

fn render_human(options: &AgreementOptions, result: Option<&AgreementResult>, pairwise: Option<&PairwiseAgreement>) -> String {
    let mut out = String::new();
    if let Some(r) = result {
        out.push_str(&format!(
            "{} on {}.{}\n",
            color("1", &r.measure.to_string()),
            options.layer,
            options.feature
        ));
        out.push_str(&format!("  annotators: {}\n", r.annotators.join(", ")));
        out.push_str(&format!(
            "  value:      {} ({})\n",
            coefficient_colored(r.value),
            kappa_interpretation(r.value)
        ));
        out.push_str(&format!("  observed:   {}\n", format_coefficient(r.observed)));
        out.push_str(&format!("  expected:   {}\n", format_coefficient(r.expected)));
        out.push_str(&format!("  items:      {}\n", r.items));
        out.push_str(&format!(
            "  skipped:    {} incomplete, {} unlabeled, {} stacked\n",
            r.incomplete_by_position.len(),
            r.incomplete_by_label.len(),
            r.stacked.len()
        ));
        for (what, positions) in [
            ("incomplete", &r.incomplete_by_position),
            ("unlabeled", &r.incomplete_by_label),
            ("stacked", &r.stacked),
        ] {
            for p in positions {
                out.push_str(&format!("    {} {}\n", color("33", what), p));
            }
        }
    }

    if let Some(m) = pairwise {
        if result.is_some() {
            out.push('\n');
        }
        out.push_str(&format!("Pairwise {} on {}.{}\n", m.measure, options.layer, options.feature));
        let width = m.annotators.iter().map(|a| a.len()).max().unwrap_or(0).max(9);
        out.push_str(&format!("  {:width$}", "", width = width));
        for a in &m.annotators {
            out.push_str(&format!(" {:>width$}", a, width = width));
        }
        out.push('\n');
        for (i, a) in m.annotators.iter().enumerate() {
            out.push_str(&format!("  {:width$}", a, width = width));
            for v in &m.matrix[i] {
                out.push_str(&format!(" {:>width$}", format_coefficient(*v), width = width));
            }
            out.push('\n');
        }
        out.push_str(&format!("  mean: {}\n", format_coefficient(m.mean())));
    }
    out
}

pub fn run(args: AgreementArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let options = resolve_options(&args, config.agreement.as_ref())?;
    let differ = config.differ().map_err(|e| e.to_string())?;
    let documents = load_documents(&args.files)?;
    let refs: Vec<_> = documents.iter().collect();
    let diff = differ
        .diff(&[options.layer.as_str()], &refs)
        .map_err(|e| e.to_string())?;

    // Cohen over more than two files: pairwise matrix only.
    let pairs_only = options.measure == Measure::CohenKappa && documents.len() > 2 && options.annotators.is_empty();
    let result = if pairs_only {
        None
    } else {
        Some(agreement(&diff, &options).map_err(|e| e.to_string())?)
    };
    let pairwise = if args.pairwise || pairs_only {
        Some(pairwise_agreement(&diff, &options).map_err(|e| e.to_string())?)
    } else {
        None
    };

    let content = match args.format {
        OutputFormat::Human => render_human(&options, result.as_ref(), pairwise.as_ref()),
        OutputFormat::Json => {
            let report = json!({
                "layer": options.layer,
                "feature": options.feature,
                "result": result,
                "pairwise": pairwise,
            });
            serde_json::to_string_pretty(&report)
                .map(|s| s + "\n")
                .map_err(|e| format!("Failed to serialize report: {}", e))?
        }
    };
    write_output(&content, args.output.as_deref())
}
