//! In-memory annotation store.
//!
//! [`AnnotatedDocument`] holds one annotator's view of one document: the
//! text plus a flat list of typed, positioned [`Annotation`]s with feature
//! maps. Relation annotations reference their endpoints through
//! [`FeatureValue::Ref`] features.
//!
//! The diff engine only ever reads from this store. Annotation ids are
//! document-local and carry no meaning across annotators.

use crate::error::{Error, Result};
use crate::position::Offsets;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Document-local annotation handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A feature value.
///
/// JSON form: `null`, `true`, `42`, `"NN"` or `{"ref": 7}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Unset
    #[default]
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// String / tag value
    String(String),
    /// Reference to another annotation in the same document
    Ref {
        /// Referenced annotation
        #[serde(rename = "ref")]
        target: AnnotationId,
    },
}

impl FeatureValue {
    /// True for [`FeatureValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    /// String payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced annotation, if any.
    #[must_use]
    pub fn as_ref_id(&self) -> Option<AnnotationId> {
        match self {
            FeatureValue::Ref { target } => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Null => write!(f, "<null>"),
            FeatureValue::Bool(b) => write!(f, "{}", b),
            FeatureValue::Integer(i) => write!(f, "{}", i),
            FeatureValue::String(s) => write!(f, "{}", s),
            FeatureValue::Ref { target } => write!(f, "{}", target),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::String(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::String(s)
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Bool(b)
    }
}

impl From<i64> for FeatureValue {
    fn from(i: i64) -> Self {
        FeatureValue::Integer(i)
    }
}

impl From<AnnotationId> for FeatureValue {
    fn from(target: AnnotationId) -> Self {
        FeatureValue::Ref { target }
    }
}

static NULL: FeatureValue = FeatureValue::Null;

/// One annotation in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Document-local id
    pub id: AnnotationId,
    /// Layer (annotation type) name
    pub layer: String,
    /// Start offset (inclusive)
    pub begin: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Feature values by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, FeatureValue>,
}

impl Annotation {
    /// Start building an annotation on `layer`.
    #[must_use]
    pub fn builder(layer: impl Into<String>) -> AnnotationBuilder {
        AnnotationBuilder::new(layer)
    }

    /// Offsets of this annotation.
    #[must_use]
    pub fn offsets(&self) -> Offsets {
        Offsets::new(self.begin, self.end)
    }

    /// Feature value by name; missing features read as `Null`.
    #[must_use]
    pub fn feature(&self, name: &str) -> &FeatureValue {
        self.features.get(name).unwrap_or(&NULL)
    }

    /// True if any feature points at another annotation (relations do).
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.features.values().any(|v| v.as_ref_id().is_some())
    }

    /// Set a feature value. Setting `Null` removes the feature.
    pub fn set_feature(&mut self, name: impl Into<String>, value: FeatureValue) {
        let name = name.into();
        if value.is_null() {
            self.features.remove(&name);
        } else {
            self.features.insert(name, value);
        }
    }
}

/// Builder for [`Annotation`]s; the id is assigned on insert.
#[derive(Debug, Clone)]
pub struct AnnotationBuilder {
    layer: String,
    begin: usize,
    end: usize,
    features: BTreeMap<String, FeatureValue>,
}

impl AnnotationBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            begin: 0,
            end: 0,
            features: BTreeMap::new(),
        }
    }

    /// Set span offsets.
    #[must_use]
    pub const fn span(mut self, begin: usize, end: usize) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    /// Set a feature value.
    #[must_use]
    pub fn feature(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.features.insert(name.into(), value);
        }
        self
    }

    /// Set several feature values.
    #[must_use]
    pub fn features<K, V>(mut self, features: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FeatureValue>,
    {
        for (k, v) in features {
            self = self.feature(k, v);
        }
        self
    }
}

/// One annotator's annotations over one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    /// Document name
    pub name: String,
    /// Annotator (user) who produced these annotations
    pub annotator: String,
    /// Document text; empty text disables offset bounds checks
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(skip)]
    next_id: u64,
    /// Position of each annotation in `annotations`; empty until built.
    #[serde(skip)]
    by_id: HashMap<AnnotationId, usize>,
}

impl AnnotatedDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new(name: impl Into<String>, annotator: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotator: annotator.into(),
            text: text.into(),
            annotations: Vec::new(),
            next_id: 0,
            by_id: HashMap::new(),
        }
    }

    /// Copy of this document's text and name for another annotator, without annotations.
    #[must_use]
    pub fn blank_copy(&self, annotator: impl Into<String>) -> Self {
        Self::new(self.name.clone(), annotator, self.text.clone())
    }

    /// Parse a document from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        doc.reindex();
        Ok(doc)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| Error::parse(format!("{}: {}", path.display(), e)))
    }

    /// Text length in characters.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text covered by `offsets` (character offsets).
    #[must_use]
    pub fn covered_text(&self, offsets: Offsets) -> Option<String> {
        if offsets.begin > offsets.end || offsets.end > self.text_len() {
            return None;
        }
        Some(
            self.text
                .chars()
                .skip(offsets.begin)
                .take(offsets.len())
                .collect(),
        )
    }

    /// Check offsets against the text.
    pub fn check_offsets(&self, begin: usize, end: usize) -> Result<Offsets> {
        let offsets = Offsets::try_new(begin, end)?;
        if !self.text.is_empty() && end > self.text_len() {
            return Err(Error::invalid_position(format!(
                "{} exceeds text length {} in '{}'",
                offsets,
                self.text_len(),
                self.name
            )));
        }
        Ok(offsets)
    }

    fn fresh_id(&mut self) -> Result<AnnotationId> {
        let exhausted = || Error::invalid_input(format!("annotation ids exhausted in '{}'", self.name));
        if self.next_id == 0 {
            self.next_id = match self.annotations.iter().map(|a| a.id.0).max() {
                Some(max) => max.checked_add(1).ok_or_else(exhausted)?,
                None => 1,
            };
        }
        let id = AnnotationId(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or_else(exhausted)?;
        Ok(id)
    }

    /// Rebuild the id lookup table.
    fn reindex(&mut self) {
        self.by_id = self
            .annotations
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
    }

    fn index_of(&self, id: AnnotationId) -> Option<usize> {
        if self.by_id.len() == self.annotations.len() {
            self.by_id
                .get(&id)
                .copied()
                .filter(|&i| self.annotations.get(i).is_some_and(|a| a.id == id))
        } else {
            self.annotations.iter().position(|a| a.id == id)
        }
    }

    /// Insert an annotation, assigning a fresh id.
    pub fn insert(&mut self, builder: AnnotationBuilder) -> Result<AnnotationId> {
        self.check_offsets(builder.begin, builder.end)?;
        for value in builder.features.values() {
            if let Some(target) = value.as_ref_id() {
                if self.get(target).is_none() {
                    return Err(Error::unknown_annotation(format!(
                        "{} referenced from new {} annotation",
                        target, builder.layer
                    )));
                }
            }
        }
        let id = self.fresh_id()?;
        if self.by_id.len() != self.annotations.len() {
            self.reindex();
        }
        self.by_id.insert(id, self.annotations.len());
        self.annotations.push(Annotation {
            id,
            layer: builder.layer,
            begin: builder.begin,
            end: builder.end,
            features: builder.features,
        });
        Ok(id)
    }

    /// Convenience: insert a span annotation with one feature.
    pub fn add_span(
        &mut self,
        layer: &str,
        begin: usize,
        end: usize,
        feature: &str,
        value: impl Into<FeatureValue>,
    ) -> Result<AnnotationId> {
        self.insert(Annotation::builder(layer).span(begin, end).feature(feature, value))
    }

    /// Convenience: insert a relation between two existing annotations.
    ///
    /// The relation takes the offsets of its target, as relation layers
    /// conventionally anchor on the dependent.
    pub fn add_relation(
        &mut self,
        layer: &str,
        (source_feature, source): (&str, AnnotationId),
        (target_feature, target): (&str, AnnotationId),
        label_feature: &str,
        label: impl Into<FeatureValue>,
    ) -> Result<AnnotationId> {
        let anchor = self
            .get(target)
            .ok_or_else(|| Error::unknown_annotation(target.to_string()))?
            .offsets();
        self.insert(
            Annotation::builder(layer)
                .span(anchor.begin, anchor.end)
                .feature(source_feature, source)
                .feature(target_feature, target)
                .feature(label_feature, label),
        )
    }

    /// All annotations in insertion order.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotation by id.
    #[must_use]
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.index_of(id).map(|i| &self.annotations[i])
    }

    /// Mutable annotation by id.
    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        let i = self.index_of(id)?;
        self.annotations.get_mut(i)
    }

    /// Remove an annotation by id.
    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| Error::unknown_annotation(id.to_string()))?;
        let removed = self.annotations.remove(idx);
        self.reindex();
        Ok(removed)
    }

    /// Annotations of `layer` in document order (begin, end, id).
    #[must_use]
    pub fn select(&self, layer: &str) -> Vec<&Annotation> {
        let mut selected: Vec<&Annotation> =
            self.annotations.iter().filter(|a| a.layer == layer).collect();
        selected.sort_by_key(|a| (a.begin, a.end, a.id));
        selected
    }

    /// Annotations of `layer` exactly at `offsets`.
    #[must_use]
    pub fn select_at(&self, layer: &str, offsets: Offsets) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.layer == layer && a.offsets() == offsets)
            .collect()
    }

    /// Names of all layers present.
    #[must_use]
    pub fn layers(&self) -> BTreeSet<&str> {
        self.annotations.iter().map(|a| a.layer.as_str()).collect()
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// True if there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Check structural consistency: unique ids, valid offsets, resolvable references.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.annotations.len());
        for a in &self.annotations {
            if !seen.insert(a.id) {
                return Err(Error::invalid_input(format!(
                    "duplicate annotation id {} in '{}'",
                    a.id, self.name
                )));
            }
        }
        for a in &self.annotations {
            self.check_offsets(a.begin, a.end)
                .map_err(|e| Error::invalid_position(format!("{} {}: {}", a.layer, a.id, e)))?;
            for (name, value) in &a.features {
                if let Some(target) = value.as_ref_id() {
                    if !seen.contains(&target) {
                        return Err(Error::unknown_annotation(format!(
                            "{} {} feature '{}' points to missing {}",
                            a.layer, a.id, name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> AnnotatedDocument {
        AnnotatedDocument::new("doc1", "alice", "The cat sat.")
    }

    #[test]
    fn test_insert_assigns_fresh_ids() {
        let mut d = doc();
        let a = d.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        let b = d.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
        assert_ne!(a, b);
        assert_eq!(d.len(), 2);
        assert_eq!(d.get(b).unwrap().feature("PosValue").as_str(), Some("NN"));
    }

    #[test]
    fn test_fresh_id_exhausted() {
        let json = format!(
            r#"{{"name":"d","annotator":"a","text":"abc","annotations":[{{"id":{},"layer":"pos","begin":0,"end":1}}]}}"#,
            u64::MAX
        );
        let mut d = AnnotatedDocument::from_json(&json).unwrap();
        let err = d.add_span("pos", 1, 2, "PosValue", "X").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_lookup_after_remove_and_load() {
        let mut d = doc();
        let a = d.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        let b = d.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
        let c = d.add_span("pos", 8, 11, "PosValue", "VBD").unwrap();
        d.remove(a).unwrap();
        assert!(d.get(a).is_none());
        assert_eq!(d.get(c).unwrap().begin, 8);
        d.get_mut(b).unwrap().set_feature("PosValue", FeatureValue::from("NNS"));

        let mut loaded = AnnotatedDocument::from_json(&d.to_json().unwrap()).unwrap();
        assert_eq!(loaded.get(b).unwrap().feature("PosValue").as_str(), Some("NNS"));
        let e = loaded.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        assert!(e > c);
        assert_eq!(loaded.get(e).unwrap().end, 3);
    }

    #[test]
    fn test_insert_rejects_bad_offsets() {
        let mut d = doc();
        assert!(d.add_span("pos", 5, 2, "PosValue", "X").is_err());
        assert!(d.add_span("pos", 0, 100, "PosValue", "X").is_err());
    }

    #[test]
    fn test_select_orders_by_begin_then_end() {
        let mut d = doc();
        d.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
        d.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        d.add_span("pos", 4, 4, "PosValue", "EMPTY").unwrap();
        let order: Vec<(usize, usize)> = d.select("pos").iter().map(|a| (a.begin, a.end)).collect();
        assert_eq!(order, vec![(0, 3), (4, 4), (4, 7)]);
    }

    #[test]
    fn test_relation_anchors_on_target() {
        let mut d = doc();
        let gov = d.add_span("token", 4, 7, "form", "cat").unwrap();
        let dep = d.add_span("token", 0, 3, "form", "The").unwrap();
        let rel = d
            .add_relation("dep", ("Governor", gov), ("Dependent", dep), "DependencyType", "det")
            .unwrap();
        let rel = d.get(rel).unwrap();
        assert_eq!(rel.offsets(), Offsets::new(0, 3));
        assert_eq!(rel.feature("Governor").as_ref_id(), Some(gov));
    }

    #[test]
    fn test_relation_to_missing_endpoint_fails() {
        let mut d = doc();
        let gov = d.add_span("token", 4, 7, "form", "cat").unwrap();
        let err = d.add_relation(
            "dep",
            ("Governor", gov),
            ("Dependent", AnnotationId(99)),
            "DependencyType",
            "det",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_refs_distinct_from_integers() {
        let mut d = doc();
        let a = d.add_span("token", 0, 3, "index", 7i64).unwrap();
        d.insert(Annotation::builder("dep").span(0, 3).feature("Governor", a))
            .unwrap();
        let json = d.to_json().unwrap();
        let back = AnnotatedDocument::from_json(&json).unwrap();
        let dep = &back.select("dep")[0];
        assert_eq!(dep.feature("Governor").as_ref_id(), Some(a));
        assert_eq!(back.select("token")[0].feature("index"), &FeatureValue::Integer(7));
    }

    #[test]
    fn test_ids_continue_after_deserialize() {
        let mut d = doc();
        d.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        let mut back = AnnotatedDocument::from_json(&d.to_json().unwrap()).unwrap();
        let new_id = back.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.validate().is_ok());
        assert_ne!(new_id, back.annotations()[0].id);
    }

    #[test]
    fn test_validate_rejects_dangling_ref() {
        let json = r#"{
            "name": "d", "annotator": "a", "text": "",
            "annotations": [
                {"id": 1, "layer": "dep", "begin": 0, "end": 1, "features": {"Governor": {"ref": 5}}}
            ]
        }"#;
        assert!(AnnotatedDocument::from_json(json).is_err());
    }

    #[test]
    fn test_covered_text_uses_chars() {
        let d = AnnotatedDocument::new("d", "a", "café au lait");
        assert_eq!(d.covered_text(Offsets::new(0, 4)).as_deref(), Some("café"));
        assert_eq!(d.covered_text(Offsets::new(5, 7)).as_deref(), Some("au"));
        assert!(d.covered_text(Offsets::new(5, 70)).is_none());
    }

    #[test]
    fn test_set_feature_null_removes() {
        let mut d = doc();
        let id = d.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
        d.get_mut(id).unwrap().set_feature("PosValue", FeatureValue::Null);
        assert!(d.get(id).unwrap().features.is_empty());
    }
}
