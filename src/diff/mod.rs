//! Multi-annotator diff.
//!
//! # Overview
//!
//! Several annotators annotate the same document independently. The diff
//! aligns their annotations by [`Position`](concord_core::Position) and
//! groups the competing feature values found at each position:
//!
//! ```text
//!   alice: The/DT cat/NN sat/VBD
//!   bob:   The/DT cat/NN sat/VBN
//!
//!   pos[0-3]   {DT: alice, bob}                  agreeing
//!   pos[4-7]   {NN: alice, bob}                  agreeing
//!   pos[8-11]  {VBD: alice} {VBN: bob}           differing
//! ```
//!
//! A set is **incomplete** when some annotator has nothing at that
//! position, and **stacked** when one annotator has several annotations
//! there.
//!
//! # Example
//!
//! ```rust
//! use concord::diff::{AdapterSet, Differ, SpanDiffAdapter};
//! use concord::AnnotatedDocument;
//!
//! let mut alice = AnnotatedDocument::new("doc", "alice", "The cat sat");
//! let mut bob = alice.blank_copy("bob");
//! for (doc, last) in [(&mut alice, "VBD"), (&mut bob, "VBN")] {
//!     doc.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
//!     doc.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
//!     doc.add_span("pos", 8, 11, "PosValue", last).unwrap();
//! }
//!
//! let differ = Differ::new(AdapterSet::new().with(SpanDiffAdapter::new("pos", ["PosValue"])));
//! let result = differ.diff(&["pos"], &[&alice, &bob]).unwrap();
//! assert_eq!(result.size(), 3);
//! assert_eq!(result.differing_configuration_sets().len(), 1);
//! ```

pub mod adapter;
pub mod aligner;
pub mod cursor;
pub mod result;

pub use adapter::{adapter_for, AdapterSet, ArcDiffAdapter, DiffAdapter, SpanDiffAdapter};
pub use aligner::{align, Lane, Positioned};
pub use cursor::{overlapping_pairs, pair_markables, DoubleCursor, OverlapScan};
pub use result::{
    AnnotationEntry, Configuration, ConfigurationSet, DiffResult, DiffSummary, FeatureValues,
};

use crate::{Error, Result};
use concord_core::{AnnotatedDocument, LayerSpec};
use std::collections::HashSet;

/// Diff engine over a fixed set of layer adapters.
#[derive(Debug, Clone, Default)]
pub struct Differ {
    adapters: AdapterSet,
}

impl Differ {
    /// Create a differ using `adapters`.
    #[must_use]
    pub fn new(adapters: AdapterSet) -> Self {
        Self { adapters }
    }

    /// Create a differ from layer specs.
    pub fn from_specs(specs: &[LayerSpec]) -> Result<Self> {
        Ok(Self::new(AdapterSet::from_specs(specs)?))
    }

    /// Registered adapters.
    #[must_use]
    pub fn adapters(&self) -> &AdapterSet {
        &self.adapters
    }

    /// Diff every registered layer.
    pub fn diff_all(&self, documents: &[&AnnotatedDocument]) -> Result<DiffResult> {
        let layers: Vec<&str> = self.adapters.layers().collect();
        self.diff(&layers, documents)
    }

    /// Diff `layers` across `documents`, one document per annotator.
    ///
    /// Every requested layer must have an adapter, and annotator names must
    /// be unique; both are checked before any document is read.
    pub fn diff(&self, layers: &[&str], documents: &[&AnnotatedDocument]) -> Result<DiffResult> {
        let adapters = layers
            .iter()
            .map(|layer| self.adapters.require(layer).map(|a| (*layer, a)))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        for doc in documents {
            if !seen.insert(doc.annotator.as_str()) {
                return Err(Error::invalid_input(format!(
                    "annotator '{}' appears more than once",
                    doc.annotator
                )));
            }
        }
        if let Some(first) = documents.first() {
            for doc in documents.iter().skip(1) {
                if doc.name != first.name {
                    log::warn!(
                        "diffing differently named documents '{}' and '{}'",
                        first.name,
                        doc.name
                    );
                }
            }
        }

        let annotators: Vec<String> = documents.iter().map(|d| d.annotator.clone()).collect();
        let mut result = DiffResult::new(
            annotators,
            layers.iter().map(|l| l.to_string()).collect(),
        );

        for (layer, adapter) in adapters {
            let mut lanes = Vec::with_capacity(documents.len());
            for doc in documents {
                let mut entries = Vec::new();
                for annotation in doc.select(layer) {
                    let position = adapter.position(doc, annotation)?;
                    let values = adapter.feature_values(doc, annotation);
                    entries.push(Positioned::new(
                        position,
                        AnnotationEntry::new(doc.annotator.clone(), annotation.id, values),
                    ));
                }
                let mut lane = Lane::new(doc.annotator.clone(), entries);
                lane.sort();
                lanes.push(lane);
            }
            result.extend(align(layer, lanes)?);
        }

        let summary = result.summary();
        log::debug!(
            "diff over {} annotators: {} sets ({} agreeing, {} differing, {} incomplete)",
            documents.len(),
            summary.total,
            summary.complete_agreeing,
            summary.complete_differing,
            summary.incomplete
        );
        Ok(result)
    }
}

/// Diff `documents` over every layer in `specs`.
pub fn diff(specs: &[LayerSpec], documents: &[&AnnotatedDocument]) -> Result<DiffResult> {
    Differ::from_specs(specs)?.diff_all(documents)
}
