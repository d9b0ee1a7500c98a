//! Bulk create/delete over search or diff hits.
//!
//! The operator applies one action to many spans at once, grouped by
//! document. Whether an annotation "already exists" at a hit is decided the
//! same way the diff decides it: by [`Position`] equality, through a
//! [`SpanDiffAdapter`] for the target layer.
//!
//! ```text
//! CreateOrOverride        existing?  override?  stacking?   outcome
//!                         no         -          -           created
//!                         yes        yes        -           updated
//!                         yes        no         yes         created
//!                         yes        no         no          skipped
//!
//! Delete                  existing?  only_matching && values differ
//!                         no         -                             skipped
//!                         yes        no                            deleted
//!                         yes        yes                           skipped
//! ```

use crate::diff::{AnnotationEntry, DiffAdapter, FeatureValues, SpanDiffAdapter};
use crate::search::HitsByDocument;
use crate::{Error, Result};
use concord_core::{
    AnnotatedDocument, Annotation, AnnotationId, FeatureValue, LayerKind, LayerSpec, Offsets, Position,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// What to do at each hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Create an annotation with the feature state, or override an existing one
    CreateOrOverride,
    /// Delete annotations at the hit
    Delete,
}

/// Flags refining a [`BulkAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkOptions {
    /// Create: overwrite the features of an existing annotation
    #[serde(default)]
    pub override_existing: bool,
    /// Delete: only remove annotations whose compared values equal the state
    #[serde(default)]
    pub only_matching_features: bool,
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkCounts {
    /// Annotations created
    pub created: usize,
    /// Annotations whose features were overwritten
    pub updated: usize,
    /// Annotations removed
    pub deleted: usize,
    /// Hits or annotations left untouched
    pub skipped: usize,
}

impl BulkCounts {
    /// Number of changes made.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl AddAssign for BulkCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.updated += rhs.updated;
        self.deleted += rhs.deleted;
        self.skipped += rhs.skipped;
    }
}

/// Per-document and total outcome of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkReport {
    /// Counts per document name
    pub documents: BTreeMap<String, BulkCounts>,
    /// Sum over all documents
    pub total: BulkCounts,
}

/// Applies one action with one feature state to a span layer.
#[derive(Debug, Clone)]
pub struct BulkOperator {
    adapter: SpanDiffAdapter,
    allow_stacking: bool,
    state: FeatureValues,
    action: BulkAction,
    options: BulkOptions,
}

impl BulkOperator {
    /// Operator on `layer` setting (or matching) `state`.
    ///
    /// Only span layers are supported; the compared features are the
    /// layer's features.
    pub fn new(layer: &LayerSpec, action: BulkAction, state: FeatureValues) -> Result<Self> {
        layer.validate()?;
        if layer.kind != LayerKind::Span {
            return Err(Error::invalid_input(format!(
                "bulk operations need a span layer, '{}' is a relation layer",
                layer.name
            )));
        }
        Ok(Self {
            adapter: SpanDiffAdapter::new(layer.name.clone(), layer.features.iter().cloned()),
            allow_stacking: layer.allow_stacking,
            state,
            action,
            options: BulkOptions::default(),
        })
    }

    /// Set the option flags.
    #[must_use]
    pub fn with_options(mut self, options: BulkOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply to every hit. Documents are matched by name.
    ///
    /// All hits are checked first: an unknown document, offsets outside a
    /// document, or a reference in the feature state that does not resolve
    /// in a target document fail the whole run before anything is changed.
    /// Documents are only updated once every one of them was processed.
    pub fn apply(&self, documents: &mut [AnnotatedDocument], hits: &HitsByDocument) -> Result<BulkReport> {
        let mut targets = Vec::with_capacity(hits.len());
        for (name, offsets) in hits {
            let idx = documents
                .iter()
                .position(|d| &d.name == name)
                .ok_or_else(|| Error::invalid_input(format!("no document named '{}'", name)))?;
            let doc = &documents[idx];
            if self.action == BulkAction::CreateOrOverride {
                self.check_references(doc)?;
            }
            let positions = offsets
                .iter()
                .map(|o| -> Result<Position> {
                    doc.check_offsets(o.begin, o.end)?;
                    Ok(Position::span(self.adapter.layer(), o.begin, o.end)?)
                })
                .collect::<Result<Vec<_>>>()?;
            targets.push((idx, positions));
        }

        // Work on copies; nothing is written back unless every document succeeds.
        let mut report = BulkReport::default();
        let mut staged = Vec::with_capacity(targets.len());
        for (idx, positions) in targets {
            let mut doc = documents[idx].clone();
            let mut counts = BulkCounts::default();
            for position in &positions {
                counts += match self.action {
                    BulkAction::CreateOrOverride => self.create_or_override(&mut doc, position)?,
                    BulkAction::Delete => self.delete(&mut doc, position)?,
                };
            }
            report.total += counts;
            *report.documents.entry(doc.name.clone()).or_default() += counts;
            staged.push((idx, doc));
        }
        for (idx, doc) in staged {
            documents[idx] = doc;
        }

        log::debug!(
            "bulk {:?} on '{}': {} created, {} updated, {} deleted, {} skipped",
            self.action,
            self.adapter.layer(),
            report.total.created,
            report.total.updated,
            report.total.deleted,
            report.total.skipped
        );
        Ok(report)
    }

    fn check_references(&self, doc: &AnnotatedDocument) -> Result<()> {
        for (feature, value) in &self.state {
            if let Some(target) = value.as_ref_id() {
                if doc.get(target).is_none() {
                    return Err(concord_core::Error::unknown_annotation(format!(
                        "{} (feature '{}') in '{}'",
                        target, feature, doc.name
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Entries of the annotations occupying exactly `position`.
    fn existing(&self, doc: &AnnotatedDocument, position: &Position) -> Result<Vec<AnnotationEntry>> {
        let mut entries = Vec::new();
        for ann in doc.select_at(self.adapter.layer(), position.primary()) {
            if &self.adapter.position(doc, ann)? == position {
                entries.push(AnnotationEntry::new(
                    doc.annotator.clone(),
                    ann.id,
                    self.adapter.feature_values(doc, ann),
                ));
            }
        }
        Ok(entries)
    }

    fn matches_state(&self, entry: &AnnotationEntry) -> bool {
        self.adapter
            .compared_features()
            .iter()
            .all(|f| entry.value(f) == self.state.get(f).unwrap_or(&FeatureValue::Null))
    }

    fn create(&self, doc: &mut AnnotatedDocument, at: Offsets) -> Result<AnnotationId> {
        let builder = Annotation::builder(self.adapter.layer())
            .span(at.begin, at.end)
            .features(self.state.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k.clone(), v.clone())));
        Ok(doc.insert(builder)?)
    }

    fn create_or_override(&self, doc: &mut AnnotatedDocument, position: &Position) -> Result<BulkCounts> {
        let mut counts = BulkCounts::default();
        let existing = self.existing(doc, position)?;
        match existing.first() {
            None => {
                self.create(doc, position.primary())?;
                counts.created += 1;
            }
            Some(entry) if self.options.override_existing => {
                let ann = doc
                    .get_mut(entry.annotation)
                    .ok_or_else(|| concord_core::Error::unknown_annotation(entry.annotation.to_string()))?;
                for (feature, value) in &self.state {
                    ann.set_feature(feature.clone(), value.clone());
                }
                counts.updated += 1;
            }
            Some(_) if self.allow_stacking => {
                self.create(doc, position.primary())?;
                counts.created += 1;
            }
            Some(entry) => {
                log::warn!(
                    "skipping {} in '{}': {} exists and the layer does not allow stacking",
                    position,
                    doc.name,
                    entry.annotation
                );
                counts.skipped += 1;
            }
        }
        Ok(counts)
    }

    fn delete(&self, doc: &mut AnnotatedDocument, position: &Position) -> Result<BulkCounts> {
        let mut counts = BulkCounts::default();
        let existing = self.existing(doc, position)?;
        if existing.is_empty() {
            counts.skipped += 1;
            return Ok(counts);
        }
        for entry in existing {
            if self.options.only_matching_features && !self.matches_state(&entry) {
                log::warn!(
                    "keeping {} at {} in '{}': feature values differ",
                    entry.annotation,
                    position,
                    doc.name
                );
                counts.skipped += 1;
                continue;
            }
            doc.remove(entry.annotation)?;
            counts.deleted += 1;
        }
        Ok(counts)
    }
}
