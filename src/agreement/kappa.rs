//! Chance-corrected agreement coefficients over categorical codings.
//!
//! All coefficients take the form
//!
//! ```text
//! κ = (Ao - Ae) / (1 - Ae)
//! ```
//!
//! where `Ao` is observed and `Ae` expected (chance) agreement. When there
//! are no items, or `Ae == 1` (every rating falls into one category), the
//! coefficient is undefined and reported as `NaN`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance for treating expected agreement as exactly one.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Coefficient with its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kappa {
    /// Coefficient (`NaN` when undefined)
    pub value: f64,
    /// Observed agreement `Ao`
    pub observed: f64,
    /// Expected agreement `Ae`
    pub expected: f64,
    /// Number of items rated
    pub items: usize,
}

impl Kappa {
    fn undefined(items: usize) -> Self {
        Self {
            value: f64::NAN,
            observed: f64::NAN,
            expected: f64::NAN,
            items,
        }
    }

    fn from_parts(observed: f64, expected: f64, items: usize) -> Self {
        let value = if items == 0 || expected >= 1.0 - DEGENERATE_EPSILON {
            f64::NAN
        } else {
            (observed - expected) / (1.0 - expected)
        };
        Self {
            value,
            observed,
            expected,
            items,
        }
    }

    /// True if the coefficient could be computed.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !self.value.is_nan()
    }
}

/// Cohen's kappa for two raters.
///
/// Expected agreement uses each rater's own marginal distribution.
pub fn cohen_kappa<T: Ord>(pairs: &[(T, T)]) -> Kappa {
    if pairs.is_empty() {
        return Kappa::undefined(0);
    }
    let n = pairs.len() as f64;

    let mut marginals: BTreeMap<&T, (usize, usize)> = BTreeMap::new();
    let mut agreeing = 0usize;
    for (a, b) in pairs {
        if a == b {
            agreeing += 1;
        }
        marginals.entry(a).or_default().0 += 1;
        marginals.entry(b).or_default().1 += 1;
    }

    let observed = agreeing as f64 / n;
    let expected = marginals
        .values()
        .map(|&(ca, cb)| (ca as f64 / n) * (cb as f64 / n))
        .sum();
    Kappa::from_parts(observed, expected, pairs.len())
}

/// Fleiss' kappa for a fixed number of raters per item.
///
/// Each inner vector holds one item's ratings. Items with fewer than two
/// ratings carry no agreement information and are skipped.
pub fn fleiss_kappa<T: Ord>(items: &[Vec<T>]) -> Kappa {
    let mut n_items = 0usize;
    let mut p_bar = 0.0;
    let mut category_totals: BTreeMap<&T, usize> = BTreeMap::new();
    let mut total_ratings = 0usize;

    for ratings in items {
        if ratings.len() < 2 {
            continue;
        }
        n_items += 1;

        let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
        for r in ratings {
            *counts.entry(r).or_insert(0) += 1;
            *category_totals.entry(r).or_insert(0) += 1;
            total_ratings += 1;
        }

        let n = ratings.len() as f64;
        let sum_squared: f64 = counts.values().map(|&c| (c * c) as f64).sum();
        p_bar += (sum_squared - n) / (n * (n - 1.0));
    }

    if n_items == 0 || total_ratings == 0 {
        return Kappa::undefined(n_items);
    }
    p_bar /= n_items as f64;

    let p_e: f64 = category_totals
        .values()
        .map(|&c| {
            let p = c as f64 / total_ratings as f64;
            p * p
        })
        .sum();
    Kappa::from_parts(p_bar, p_e, n_items)
}

/// Share of items on which every rater chose the same category.
///
/// No chance correction: `value == observed` and `expected == 0`.
pub fn percent_agreement<T: Eq>(items: &[Vec<T>]) -> Kappa {
    if items.is_empty() {
        return Kappa::undefined(0);
    }
    let agreeing = items
        .iter()
        .filter(|ratings| ratings.windows(2).all(|w| w[0] == w[1]))
        .count();
    let observed = agreeing as f64 / items.len() as f64;
    Kappa {
        value: observed,
        observed,
        expected: 0.0,
        items: items.len(),
    }
}

/// Verbal reading of a kappa value (Landis & Koch).
pub fn kappa_interpretation(kappa: f64) -> &'static str {
    if kappa.is_nan() {
        "Undefined"
    } else if kappa < 0.0 {
        "Less than chance agreement"
    } else if kappa < 0.20 {
        "Slight agreement"
    } else if kappa < 0.40 {
        "Fair agreement"
    } else if kappa < 0.60 {
        "Moderate agreement"
    } else if kappa < 0.80 {
        "Substantial agreement"
    } else {
        "Almost perfect agreement"
    }
}
