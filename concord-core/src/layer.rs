//! Layer descriptions.
//!
//! A [`LayerSpec`] says how annotations of one layer are positioned and
//! which features take part in comparison. It is the serialized form used in
//! project configuration files.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How annotations of a layer are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Annotations positioned by their own offsets
    Span,
    /// Annotations positioned by the offsets of two referenced spans
    Relation,
}

/// Description of one annotation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Layer name, as used in [`crate::Annotation::layer`]
    pub name: String,
    /// Anchoring kind
    pub kind: LayerKind,
    /// Features compared between annotators (spans), or extra features
    /// compared in addition to the label (relations)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Relation label feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_feature: Option<String>,
    /// Relation feature referencing the source span
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_feature: Option<String>,
    /// Relation feature referencing the target span
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_feature: Option<String>,
    /// Whether one annotator may place several annotations at one position
    #[serde(default)]
    pub allow_stacking: bool,
}

impl LayerSpec {
    /// Span layer comparing `features`.
    #[must_use]
    pub fn span<S: Into<String>>(name: impl Into<String>, features: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Span,
            features: features.into_iter().map(Into::into).collect(),
            label_feature: None,
            source_feature: None,
            target_feature: None,
            allow_stacking: false,
        }
    }

    /// Relation layer with endpoint features and a label feature.
    #[must_use]
    pub fn relation(
        name: impl Into<String>,
        source_feature: impl Into<String>,
        target_feature: impl Into<String>,
        label_feature: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Relation,
            features: Vec::new(),
            label_feature: Some(label_feature.into()),
            source_feature: Some(source_feature.into()),
            target_feature: Some(target_feature.into()),
            allow_stacking: false,
        }
    }

    /// Set the stacking policy.
    #[must_use]
    pub fn with_stacking(mut self, allow: bool) -> Self {
        self.allow_stacking = allow;
        self
    }

    /// Features that take part in comparison, in comparison order.
    #[must_use]
    pub fn compared_features(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.features.len() + 1);
        if self.kind == LayerKind::Relation {
            if let Some(label) = &self.label_feature {
                out.push(label);
            }
        }
        for f in &self.features {
            if !out.contains(&f.as_str()) {
                out.push(f);
            }
        }
        out
    }

    /// Check that the spec is usable.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("layer name must not be empty"));
        }
        if self.kind == LayerKind::Relation {
            for (what, value) in [
                ("source_feature", &self.source_feature),
                ("target_feature", &self.target_feature),
                ("label_feature", &self.label_feature),
            ] {
                if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    return Err(Error::invalid_input(format!(
                        "relation layer '{}' needs {}",
                        self.name, what
                    )));
                }
            }
        }
        Ok(())
    }
}
