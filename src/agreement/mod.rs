//! Inter-annotator agreement over a [`DiffResult`].
//!
//! # Which sets count
//!
//! For one layer and one feature, a configuration set becomes an item of the
//! coding study only if:
//!
//! | Condition                                   | Otherwise recorded in     |
//! |---------------------------------------------|---------------------------|
//! | every compared annotator has an entry       | `incomplete_by_position`  |
//! | no compared annotator has stacked entries   | `stacked`                 |
//! | every compared annotator's value is non-null| `incomplete_by_label`     |
//!
//! Skipped sets never abort the calculation; they are reported alongside
//! the coefficient so callers can see how much of the data was used.
//!
//! # Measures
//!
//! - [`Measure::CohenKappa`]: exactly two annotators
//! - [`Measure::FleissKappa`]: two or more annotators
//! - [`Measure::PercentAgreement`]: raw share of fully agreeing items
//!
//! # Example
//!
//! ```rust
//! use concord::agreement::{agreement, AgreementOptions, Measure};
//! use concord::diff::diff;
//! use concord::{AnnotatedDocument, LayerSpec};
//!
//! let mut a = AnnotatedDocument::new("doc", "a", "");
//! let mut b = AnnotatedDocument::new("doc", "b", "");
//! for (i, (ta, tb)) in [("DT", "DT"), ("NN", "NN"), ("VB", "NN")].iter().enumerate() {
//!     a.add_span("pos", i * 2, i * 2 + 1, "PosValue", *ta).unwrap();
//!     b.add_span("pos", i * 2, i * 2 + 1, "PosValue", *tb).unwrap();
//! }
//! let result = diff(&[LayerSpec::span("pos", ["PosValue"])], &[&a, &b]).unwrap();
//!
//! let opts = AgreementOptions::new("pos", "PosValue").measure(Measure::CohenKappa);
//! let k = agreement(&result, &opts).unwrap();
//! assert_eq!(k.items, 3);
//! assert!(k.value < 1.0);
//! ```

pub mod kappa;

pub use kappa::{cohen_kappa, fleiss_kappa, kappa_interpretation, percent_agreement, Kappa};

use crate::diff::DiffResult;
use crate::{Error, Result};
use concord_core::{FeatureValue, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Agreement coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Measure {
    /// Cohen's kappa (two annotators)
    #[default]
    #[serde(rename = "cohen")]
    CohenKappa,
    /// Fleiss' kappa (two or more annotators)
    #[serde(rename = "fleiss")]
    FleissKappa,
    /// Percentage of items with full agreement
    #[serde(rename = "percent")]
    PercentAgreement,
}

impl Measure {
    /// Short name, as accepted by [`Measure::from_str`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Measure::CohenKappa => "cohen",
            Measure::FleissKappa => "fleiss",
            Measure::PercentAgreement => "percent",
        }
    }

    fn check_annotators(&self, count: usize) -> Result<()> {
        match self {
            Measure::CohenKappa if count != 2 => Err(Error::agreement(format!(
                "Cohen's kappa needs exactly 2 annotators, got {}",
                count
            ))),
            _ if count < 2 => Err(Error::agreement(format!(
                "{} needs at least 2 annotators, got {}",
                self, count
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Measure::CohenKappa => "Cohen's kappa",
            Measure::FleissKappa => "Fleiss' kappa",
            Measure::PercentAgreement => "percent agreement",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Measure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cohen" | "cohen-kappa" | "kappa" => Ok(Measure::CohenKappa),
            "fleiss" | "fleiss-kappa" => Ok(Measure::FleissKappa),
            "percent" | "percentage" | "raw" => Ok(Measure::PercentAgreement),
            other => Err(Error::agreement(format!("unknown measure '{}'", other))),
        }
    }
}

/// What to measure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgreementOptions {
    /// Layer whose sets are rated
    pub layer: String,
    /// Feature holding the category
    pub feature: String,
    /// Coefficient
    #[serde(default)]
    pub measure: Measure,
    /// Annotators to compare; empty means all annotators of the result
    #[serde(default)]
    pub annotators: Vec<String>,
}

impl AgreementOptions {
    /// Options for `feature` on `layer` with the default measure.
    #[must_use]
    pub fn new(layer: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            feature: feature.into(),
            ..Self::default()
        }
    }

    /// Set the measure.
    #[must_use]
    pub fn measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    /// Restrict to these annotators.
    #[must_use]
    pub fn annotators<S: Into<String>>(mut self, annotators: impl IntoIterator<Item = S>) -> Self {
        self.annotators = annotators.into_iter().map(Into::into).collect();
        self
    }
}

/// Coefficient plus the sets that did not take part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementResult {
    /// Coefficient used
    pub measure: Measure,
    /// Annotators compared, in rating order
    pub annotators: Vec<String>,
    /// Coefficient (`NaN` when undefined)
    pub value: f64,
    /// Observed agreement
    pub observed: f64,
    /// Expected agreement
    pub expected: f64,
    /// Number of sets rated
    pub items: usize,
    /// Sets where some compared annotator has no entry
    pub incomplete_by_position: Vec<Position>,
    /// Sets where some compared annotator left the feature empty
    pub incomplete_by_label: Vec<Position>,
    /// Sets with stacked entries
    pub stacked: Vec<Position>,
}

impl AgreementResult {
    /// True if the coefficient could be computed.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !self.value.is_nan()
    }

    /// Number of sets left out.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.incomplete_by_position.len() + self.incomplete_by_label.len() + self.stacked.len()
    }
}

/// Categorical ratings extracted from a diff, one row per rated set.
#[derive(Debug, Clone, Default)]
pub struct CodingStudy {
    /// Annotators, in column order
    pub annotators: Vec<String>,
    /// Positions of the rated sets
    pub positions: Vec<Position>,
    /// `ratings[i][j]`: value of annotator `j` on item `i`
    pub ratings: Vec<Vec<FeatureValue>>,
    /// See [`AgreementResult::incomplete_by_position`]
    pub incomplete_by_position: Vec<Position>,
    /// See [`AgreementResult::incomplete_by_label`]
    pub incomplete_by_label: Vec<Position>,
    /// See [`AgreementResult::stacked`]
    pub stacked: Vec<Position>,
}

impl CodingStudy {
    /// Extract the study for `feature` on `layer` over `annotators`.
    pub fn build(result: &DiffResult, layer: &str, feature: &str, annotators: &[String]) -> Self {
        let mut study = Self {
            annotators: annotators.to_vec(),
            ..Self::default()
        };

        for set in result.configuration_sets_for(layer) {
            let position = set.position().clone();
            if !set.covers(annotators) {
                study.incomplete_by_position.push(position);
                continue;
            }
            if annotators.iter().any(|a| set.stacked_annotators().contains(a)) {
                log::warn!("skipping stacked set at {}", position);
                study.stacked.push(position);
                continue;
            }
            let row: Vec<FeatureValue> = annotators
                .iter()
                .filter_map(|a| set.value_for(a, feature).cloned())
                .collect();
            if row.len() != annotators.len() || row.iter().any(FeatureValue::is_null) {
                study.incomplete_by_label.push(position);
                continue;
            }
            study.positions.push(position);
            study.ratings.push(row);
        }
        study
    }

    /// Number of rated items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// True if nothing was rated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Compute `measure` over the ratings.
    #[must_use]
    pub fn compute(&self, measure: Measure) -> Kappa {
        match measure {
            Measure::CohenKappa => {
                let pairs: Vec<(&FeatureValue, &FeatureValue)> = self
                    .ratings
                    .iter()
                    .filter_map(|r| match r.as_slice() {
                        [a, b] => Some((a, b)),
                        _ => None,
                    })
                    .collect();
                cohen_kappa(&pairs)
            }
            Measure::FleissKappa => fleiss_kappa(&self.ratings),
            Measure::PercentAgreement => percent_agreement(&self.ratings),
        }
    }
}

fn resolve_annotators(result: &DiffResult, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(result.annotators().to_vec());
    }
    let mut seen = BTreeSet::new();
    for a in requested {
        if !result.annotators().contains(a) {
            return Err(Error::agreement(format!("annotator '{}' is not part of the diff", a)));
        }
        if !seen.insert(a.as_str()) {
            return Err(Error::agreement(format!("annotator '{}' is listed more than once", a)));
        }
    }
    Ok(requested.to_vec())
}

fn check_layer(result: &DiffResult, layer: &str) -> Result<()> {
    if result.layers().iter().any(|l| l == layer) {
        Ok(())
    } else {
        Err(Error::agreement(format!("layer '{}' was not diffed", layer)))
    }
}

/// Agreement on `options.feature` of `options.layer`.
///
/// Errors only on unusable options: unknown layer or annotator, or an
/// annotator count the measure cannot handle. Degenerate data yields `NaN`.
pub fn agreement(result: &DiffResult, options: &AgreementOptions) -> Result<AgreementResult> {
    check_layer(result, &options.layer)?;
    let annotators = resolve_annotators(result, &options.annotators)?;
    options.measure.check_annotators(annotators.len())?;

    let study = CodingStudy::build(result, &options.layer, &options.feature, &annotators);
    let k = study.compute(options.measure);
    log::debug!(
        "{} on {}.{}: {:.4} over {} items ({} incomplete, {} unlabeled, {} stacked)",
        options.measure,
        options.layer,
        options.feature,
        k.value,
        k.items,
        study.incomplete_by_position.len(),
        study.incomplete_by_label.len(),
        study.stacked.len()
    );

    Ok(AgreementResult {
        measure: options.measure,
        annotators,
        value: k.value,
        observed: k.observed,
        expected: k.expected,
        items: k.items,
        incomplete_by_position: study.incomplete_by_position,
        incomplete_by_label: study.incomplete_by_label,
        stacked: study.stacked,
    })
}

/// Agreement for every pair of annotators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAgreement {
    /// Coefficient used
    pub measure: Measure,
    /// Row/column labels
    pub annotators: Vec<String>,
    /// Symmetric matrix; the diagonal is 1.0
    pub matrix: Vec<Vec<f64>>,
}

impl PairwiseAgreement {
    /// Coefficient between two annotators.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.annotators.iter().position(|x| x == a)?;
        let j = self.annotators.iter().position(|x| x == b)?;
        Some(self.matrix[i][j])
    }

    /// Mean over the defined off-diagonal entries (`NaN` if none).
    #[must_use]
    pub fn mean(&self) -> f64 {
        let mut sum = 0.0;
        let mut n = 0usize;
        for i in 0..self.annotators.len() {
            for j in (i + 1)..self.annotators.len() {
                let v = self.matrix[i][j];
                if !v.is_nan() {
                    sum += v;
                    n += 1;
                }
            }
        }
        if n == 0 {
            f64::NAN
        } else {
            sum / n as f64
        }
    }
}

/// `options.measure` for every annotator pair.
///
/// Each pair is rated on the sets complete for that pair, so pairs may be
/// based on different numbers of items.
pub fn pairwise_agreement(result: &DiffResult, options: &AgreementOptions) -> Result<PairwiseAgreement> {
    check_layer(result, &options.layer)?;
    let annotators = resolve_annotators(result, &options.annotators)?;
    let n = annotators.len();
    let mut matrix = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let pair = [annotators[i].clone(), annotators[j].clone()];
            let study = CodingStudy::build(result, &options.layer, &options.feature, &pair);
            let v = study.compute(options.measure).value;
            matrix[i][j] = v;
            matrix[j][i] = v;
        }
    }

    Ok(PairwiseAgreement {
        measure: options.measure,
        annotators,
        matrix,
    })
}
