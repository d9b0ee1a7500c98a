//! Diff adapters: how a layer's annotations become positions.
//!
//! One adapter per layer. The adapter decides which [`Position`] an
//! annotation occupies and which feature values take part in comparison.
//! Adapters only read from the [`AnnotatedDocument`]; they never mutate it.

use super::result::FeatureValues;
use crate::{Error, Result};
use concord_core::{AnnotatedDocument, Annotation, LayerKind, LayerSpec, Position};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Strategy for positioning and comparing the annotations of one layer.
pub trait DiffAdapter: Send + Sync {
    /// Layer handled by this adapter.
    fn layer(&self) -> &str;

    /// Features compared between annotators.
    fn compared_features(&self) -> &[String];

    /// Position occupied by `annotation` in `document`.
    ///
    /// Returns an error for offsets that cannot be ordered (e.g. `begin >
    /// end`) or relation endpoints that cannot be resolved.
    fn position(&self, document: &AnnotatedDocument, annotation: &Annotation) -> Result<Position>;

    /// Compared feature values of `annotation`.
    fn feature_values(&self, _document: &AnnotatedDocument, annotation: &Annotation) -> FeatureValues {
        self.compared_features()
            .iter()
            .map(|f| (f.clone(), annotation.feature(f).clone()))
            .collect()
    }
}

/// Adapter for span layers: position is the annotation's own offsets.
#[derive(Debug, Clone)]
pub struct SpanDiffAdapter {
    layer: String,
    features: Vec<String>,
}

impl SpanDiffAdapter {
    /// Create an adapter for `layer` comparing `features`.
    #[must_use]
    pub fn new<S: Into<String>>(layer: impl Into<String>, features: impl IntoIterator<Item = S>) -> Self {
        Self {
            layer: layer.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

impl DiffAdapter for SpanDiffAdapter {
    fn layer(&self) -> &str {
        &self.layer
    }

    fn compared_features(&self) -> &[String] {
        &self.features
    }

    fn position(&self, _document: &AnnotatedDocument, annotation: &Annotation) -> Result<Position> {
        Position::span(&self.layer, annotation.begin, annotation.end).map_err(|e| {
            Error::invalid_input(format!("{} {}: {}", self.layer, annotation.id, e))
        })
    }
}

/// Adapter for relation layers: position is the pair of endpoint offsets.
///
/// Only the endpoints' begin/end are compared; the endpoints' own features
/// do not take part.
#[derive(Debug, Clone)]
pub struct ArcDiffAdapter {
    layer: String,
    source_feature: String,
    target_feature: String,
    features: Vec<String>,
}

impl ArcDiffAdapter {
    /// Create an adapter comparing `label_feature`.
    #[must_use]
    pub fn new(
        layer: impl Into<String>,
        source_feature: impl Into<String>,
        target_feature: impl Into<String>,
        label_feature: impl Into<String>,
    ) -> Self {
        Self {
            layer: layer.into(),
            source_feature: source_feature.into(),
            target_feature: target_feature.into(),
            features: vec![label_feature.into()],
        }
    }

    /// Compare additional features besides the label.
    #[must_use]
    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        for f in features {
            let f = f.into();
            if !self.features.contains(&f) {
                self.features.push(f);
            }
        }
        self
    }

    /// Label feature.
    #[must_use]
    pub fn label_feature(&self) -> &str {
        &self.features[0]
    }

    fn endpoint<'d>(
        &self,
        document: &'d AnnotatedDocument,
        annotation: &Annotation,
        feature: &str,
    ) -> Result<&'d Annotation> {
        let target = annotation.feature(feature).as_ref_id().ok_or_else(|| {
            Error::invalid_input(format!(
                "{} {} in '{}' has no '{}' endpoint",
                self.layer, annotation.id, document.name, feature
            ))
        })?;
        let endpoint = document.get(target).ok_or_else(|| {
            Error::invalid_input(format!(
                "{} {} in '{}': '{}' points to missing {}",
                self.layer, annotation.id, document.name, feature, target
            ))
        })?;
        // Endpoints must be plain spans; anything carrying references is a relation.
        if endpoint.layer == self.layer || endpoint.has_references() {
            return Err(Error::invalid_input(format!(
                "{} {} in '{}': '{}' points to relation {} on '{}', not a span",
                self.layer, annotation.id, document.name, feature, target, endpoint.layer
            )));
        }
        Ok(endpoint)
    }
}

impl DiffAdapter for ArcDiffAdapter {
    fn layer(&self) -> &str {
        &self.layer
    }

    fn compared_features(&self) -> &[String] {
        &self.features
    }

    fn position(&self, document: &AnnotatedDocument, annotation: &Annotation) -> Result<Position> {
        let source = self.endpoint(document, annotation, &self.source_feature)?;
        let target = self.endpoint(document, annotation, &self.target_feature)?;
        Position::arc(&self.layer, source.offsets(), target.offsets()).map_err(|e| {
            Error::invalid_input(format!("{} {}: {}", self.layer, annotation.id, e))
        })
    }
}

/// Build the adapter described by `spec`.
pub fn adapter_for(spec: &LayerSpec) -> Result<Arc<dyn DiffAdapter>> {
    spec.validate()?;
    match spec.kind {
        LayerKind::Span => Ok(Arc::new(SpanDiffAdapter::new(
            spec.name.clone(),
            spec.features.iter().cloned(),
        ))),
        LayerKind::Relation => {
            let (Some(source), Some(target), Some(label)) = (
                spec.source_feature.as_ref(),
                spec.target_feature.as_ref(),
                spec.label_feature.as_ref(),
            ) else {
                return Err(Error::config(format!(
                    "relation layer '{}' is missing endpoint or label features",
                    spec.name
                )));
            };
            Ok(Arc::new(
                ArcDiffAdapter::new(spec.name.clone(), source.clone(), target.clone(), label.clone())
                    .with_features(spec.features.iter().cloned()),
            ))
        }
    }
}

/// Adapters keyed by layer name.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: BTreeMap<String, Arc<dyn DiffAdapter>>,
}

impl AdapterSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every spec; duplicate layer names are rejected.
    pub fn from_specs(specs: &[LayerSpec]) -> Result<Self> {
        let mut set = Self::new();
        for spec in specs {
            if set.adapters.contains_key(&spec.name) {
                return Err(Error::config(format!("layer '{}' declared twice", spec.name)));
            }
            set.register(adapter_for(spec)?);
        }
        Ok(set)
    }

    /// Register (or replace) the adapter for its layer.
    pub fn register(&mut self, adapter: Arc<dyn DiffAdapter>) -> &mut Self {
        self.adapters.insert(adapter.layer().to_string(), adapter);
        self
    }

    /// Builder-style [`AdapterSet::register`].
    #[must_use]
    pub fn with(mut self, adapter: impl DiffAdapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    /// Adapter for `layer`.
    #[must_use]
    pub fn get(&self, layer: &str) -> Option<&Arc<dyn DiffAdapter>> {
        self.adapters.get(layer)
    }

    /// Adapter for `layer`, or [`Error::MissingAdapter`].
    pub fn require(&self, layer: &str) -> Result<&Arc<dyn DiffAdapter>> {
        self.get(layer).ok_or_else(|| Error::missing_adapter(layer))
    }

    /// Registered layer names, sorted.
    pub fn layers(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// True if no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSet")
            .field("layers", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
