//! Diff result types.
//!
//! ```text
//! DiffResult
//!   └─ ConfigurationSet   one per Position (layer + offsets)
//!        └─ Configuration one per distinct set of compared feature values
//!             └─ AnnotationEntry  one per annotator (more if stacked)
//! ```

use concord_core::{AnnotationId, FeatureValue, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Compared feature values of one annotation, by feature name.
///
/// Features an annotation does not set are present as [`FeatureValue::Null`].
pub type FeatureValues = BTreeMap<String, FeatureValue>;

/// One annotator's annotation occupying a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    /// Annotator who produced the annotation
    pub annotator: String,
    /// Handle into that annotator's document
    pub annotation: AnnotationId,
    /// Compared feature values
    pub values: FeatureValues,
}

impl AnnotationEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(annotator: impl Into<String>, annotation: AnnotationId, values: FeatureValues) -> Self {
        Self {
            annotator: annotator.into(),
            annotation,
            values,
        }
    }

    /// Value of one compared feature (`Null` if not compared).
    #[must_use]
    pub fn value(&self, feature: &str) -> &FeatureValue {
        static NULL: FeatureValue = FeatureValue::Null;
        self.values.get(feature).unwrap_or(&NULL)
    }
}

/// Entries of a set that share identical compared feature values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// The shared feature values
    pub values: FeatureValues,
    /// Entries with these values
    pub entries: Vec<AnnotationEntry>,
}

impl Configuration {
    /// Annotators contributing to this configuration.
    pub fn annotators(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.annotator.as_str())
    }

    /// Entry of `annotator`, if any.
    #[must_use]
    pub fn entry_for(&self, annotator: &str) -> Option<&AnnotationEntry> {
        self.entries.iter().find(|e| e.annotator == annotator)
    }
}

/// All annotators' entries at one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSet {
    position: Position,
    configurations: Vec<Configuration>,
    annotators: BTreeSet<String>,
    stacked: BTreeSet<String>,
}

impl ConfigurationSet {
    /// Create an empty set at `position`.
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self {
            position,
            configurations: Vec::new(),
            annotators: BTreeSet::new(),
            stacked: BTreeSet::new(),
        }
    }

    /// Add an entry, grouping it with entries that have equal values.
    ///
    /// A second entry from the same annotator marks the set stacked.
    pub fn add(&mut self, entry: AnnotationEntry) {
        if !self.annotators.insert(entry.annotator.clone()) {
            self.stacked.insert(entry.annotator.clone());
        }
        match self
            .configurations
            .iter_mut()
            .find(|c| c.values == entry.values)
        {
            Some(config) => config.entries.push(entry),
            None => self.configurations.push(Configuration {
                values: entry.values.clone(),
                entries: vec![entry],
            }),
        }
    }

    /// Position shared by all entries.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Distinct configurations, in order of first appearance.
    #[must_use]
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Annotators with at least one entry.
    #[must_use]
    pub fn annotators(&self) -> &BTreeSet<String> {
        &self.annotators
    }

    /// Annotators with more than one entry at this position.
    #[must_use]
    pub fn stacked_annotators(&self) -> &BTreeSet<String> {
        &self.stacked
    }

    /// True if any annotator has more than one entry here.
    #[must_use]
    pub fn is_stacked(&self) -> bool {
        !self.stacked.is_empty()
    }

    /// True if `annotator` contributed an entry.
    #[must_use]
    pub fn has_annotator(&self, annotator: &str) -> bool {
        self.annotators.contains(annotator)
    }

    /// True if every listed annotator contributed an entry.
    #[must_use]
    pub fn covers<S: AsRef<str>>(&self, annotators: &[S]) -> bool {
        annotators.iter().all(|a| self.has_annotator(a.as_ref()))
    }

    /// True if the set holds more than one distinct configuration.
    #[must_use]
    pub fn is_differing(&self) -> bool {
        self.configurations.len() > 1
    }

    /// All entries.
    pub fn entries(&self) -> impl Iterator<Item = &AnnotationEntry> {
        self.configurations.iter().flat_map(|c| c.entries.iter())
    }

    /// Entries of one annotator.
    #[must_use]
    pub fn entries_for(&self, annotator: &str) -> Vec<&AnnotationEntry> {
        self.entries().filter(|e| e.annotator == annotator).collect()
    }

    /// Value of `feature` chosen by `annotator`.
    ///
    /// `None` if the annotator has no entry or the set is stacked for them.
    #[must_use]
    pub fn value_for(&self, annotator: &str, feature: &str) -> Option<&FeatureValue> {
        if self.stacked.contains(annotator) {
            return None;
        }
        self.entries()
            .find(|e| e.annotator == annotator)
            .map(|e| e.value(feature))
    }
}

/// Partition counts of a [`DiffResult`].
///
/// `complete_agreeing + complete_differing + incomplete == total`.
/// `stacked` counts sets in any of those classes that hold stacked entries.
///
/// `complete_differing` is not the length of
/// [`DiffResult::differing_configuration_sets`]: it also counts complete
/// stacked sets with a single configuration, and it leaves out incomplete
/// sets that have several configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of configuration sets
    pub total: usize,
    /// Complete sets with a single configuration and no stacking
    pub complete_agreeing: usize,
    /// Complete sets with several configurations or stacking
    pub complete_differing: usize,
    /// Sets missing at least one annotator
    pub incomplete: usize,
    /// Sets with stacked entries
    pub stacked: usize,
}

/// Result of diffing several annotators' documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    annotators: Vec<String>,
    layers: Vec<String>,
    sets: BTreeMap<Position, ConfigurationSet>,
}

impl DiffResult {
    /// Create an empty result for the given annotators and layers.
    #[must_use]
    pub fn new(annotators: Vec<String>, layers: Vec<String>) -> Self {
        Self {
            annotators,
            layers,
            sets: BTreeMap::new(),
        }
    }

    /// Add configuration sets (from the aligner).
    pub fn extend(&mut self, sets: impl IntoIterator<Item = ConfigurationSet>) {
        for set in sets {
            self.sets.insert(set.position().clone(), set);
        }
    }

    /// Expected annotators.
    #[must_use]
    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    /// Layers that were diffed.
    #[must_use]
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Number of configuration sets.
    #[must_use]
    pub fn size(&self) -> usize {
        self.sets.len()
    }

    /// True if no position was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// All positions, ordered by layer then document order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.sets.keys()
    }

    /// Set at `position`.
    #[must_use]
    pub fn configuration_set(&self, position: &Position) -> Option<&ConfigurationSet> {
        self.sets.get(position)
    }

    /// All sets, ordered by layer then document order.
    pub fn configuration_sets(&self) -> impl Iterator<Item = &ConfigurationSet> {
        self.sets.values()
    }

    /// Sets of one layer.
    pub fn configuration_sets_for<'a>(
        &'a self,
        layer: &'a str,
    ) -> impl Iterator<Item = &'a ConfigurationSet> + 'a {
        self.sets.values().filter(move |s| s.position().layer() == layer)
    }

    /// True if every expected annotator contributed to `set`.
    #[must_use]
    pub fn is_complete(&self, set: &ConfigurationSet) -> bool {
        set.covers(self.annotators.as_slice())
    }

    /// True if `set` is complete, unstacked and has one configuration.
    #[must_use]
    pub fn is_agreement(&self, set: &ConfigurationSet) -> bool {
        self.is_complete(set) && !set.is_stacked() && !set.is_differing()
    }

    /// Sets missing at least one expected annotator.
    #[must_use]
    pub fn incomplete_configuration_sets(&self) -> Vec<&ConfigurationSet> {
        self.sets.values().filter(|s| !self.is_complete(s)).collect()
    }

    /// Sets with more than one configuration, complete or not.
    ///
    /// Stacking alone does not make a set differing; see
    /// [`DiffSummary::complete_differing`] for the summary's count.
    #[must_use]
    pub fn differing_configuration_sets(&self) -> Vec<&ConfigurationSet> {
        self.sets.values().filter(|s| s.is_differing()).collect()
    }

    /// Sets where an annotator placed several annotations.
    #[must_use]
    pub fn stacked_configuration_sets(&self) -> Vec<&ConfigurationSet> {
        self.sets.values().filter(|s| s.is_stacked()).collect()
    }

    /// Partition counts.
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary {
            total: self.sets.len(),
            ..DiffSummary::default()
        };
        for set in self.sets.values() {
            if set.is_stacked() {
                summary.stacked += 1;
            }
            if !self.is_complete(set) {
                summary.incomplete += 1;
            } else if self.is_agreement(set) {
                summary.complete_agreeing += 1;
            } else {
                summary.complete_differing += 1;
            }
        }
        summary
    }
}
