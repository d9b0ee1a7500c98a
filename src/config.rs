//! Project configuration: which layers exist and how they are compared.
//!
//! ```toml
//! [[layer]]
//! name = "pos"
//! kind = "span"
//! features = ["PosValue"]
//!
//! [[layer]]
//! name = "dependency"
//! kind = "relation"
//! label_feature = "DependencyType"
//! source_feature = "Governor"
//! target_feature = "Dependent"
//!
//! [agreement]
//! layer = "pos"
//! feature = "PosValue"
//! measure = "cohen"
//! ```
//!
//! Without an explicit path the file is looked up at
//! `<config dir>/concord/concord.toml` (see [`default_path`]).

use crate::agreement::AgreementOptions;
use crate::diff::{AdapterSet, Differ};
use crate::{Error, Result};
use concord_core::LayerSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "concord.toml";

/// Layers of a project plus optional agreement defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Layer descriptions
    #[serde(rename = "layer", default)]
    pub layers: Vec<LayerSpec>,
    /// Defaults for agreement runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement: Option<AgreementOptions>,
}

impl ProjectConfig {
    /// Parse and validate TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded {} layers from {}", config.layers.len(), path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default location.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = default_path()?;
                if p.exists() {
                    Self::load(&p)
                } else {
                    Err(Error::config(format!(
                        "no config given and {} does not exist (try `concord config init`)",
                        p.display()
                    )))
                }
            }
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Check layer names and agreement defaults.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for layer in &self.layers {
            layer.validate()?;
            if !names.insert(layer.name.as_str()) {
                return Err(Error::config(format!("layer '{}' declared twice", layer.name)));
            }
        }
        if let Some(agreement) = &self.agreement {
            if !names.contains(agreement.layer.as_str()) {
                return Err(Error::config(format!(
                    "agreement layer '{}' is not declared",
                    agreement.layer
                )));
            }
        }
        Ok(())
    }

    /// Layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Adapters for every layer.
    pub fn adapters(&self) -> Result<AdapterSet> {
        AdapterSet::from_specs(&self.layers)
    }

    /// Differ over every layer.
    pub fn differ(&self) -> Result<Differ> {
        Ok(Differ::new(self.adapters()?))
    }

    /// Starter config with a POS and a dependency layer.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            layers: vec![
                LayerSpec::span("pos", ["PosValue"]),
                LayerSpec::span("ne", ["value"]),
                LayerSpec::relation("dependency", "Governor", "Dependent", "DependencyType"),
            ],
            agreement: Some(AgreementOptions::new("pos", "PosValue")),
        }
    }
}

/// `<config dir>/concord`, or `.concord` when the platform has none.
pub fn config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(mut dir) => {
            dir.push("concord");
            dir
        }
        None => PathBuf::from(".concord"),
    }
}

/// Default config file path.
pub fn default_path() -> Result<PathBuf> {
    Ok(config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::Measure;
    use concord_core::LayerKind;

    const SAMPLE: &str = r#"
[[layer]]
name = "pos"
kind = "span"
features = ["PosValue"]

[[layer]]
name = "dependency"
kind = "relation"
label_feature = "DependencyType"
source_feature = "Governor"
target_feature = "Dependent"
allow_stacking = true

[agreement]
layer = "pos"
feature = "PosValue"
measure = "fleiss"
"#;

    #[test]
    fn test_parse() {
        let config = ProjectConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.layers.len(), 2);
        let dep = config.layer("dependency").unwrap();
        assert_eq!(dep.kind, LayerKind::Relation);
        assert!(dep.allow_stacking);
        assert_eq!(config.agreement.as_ref().unwrap().measure, Measure::FleissKappa);
        assert_eq!(config.adapters().unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_duplicates_and_incomplete_relations() {
        let dup = "[[layer]]\nname = \"pos\"\nkind = \"span\"\n[[layer]]\nname = \"pos\"\nkind = \"span\"\n";
        assert!(matches!(ProjectConfig::from_toml(dup), Err(Error::Config(_))));

        let rel = "[[layer]]\nname = \"dep\"\nkind = \"relation\"\nlabel_feature = \"x\"\n";
        assert!(ProjectConfig::from_toml(rel).is_err());

        assert!(matches!(ProjectConfig::from_toml("[[layer]]\nname = 3"), Err(Error::Toml(_))));
    }

    #[test]
    fn test_agreement_layer_must_exist() {
        let text = "[[layer]]\nname = \"pos\"\nkind = \"span\"\n[agreement]\nlayer = \"ne\"\nfeature = \"value\"\n";
        assert!(ProjectConfig::from_toml(text).is_err());
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = ProjectConfig::sample();
        let text = sample.to_toml().unwrap();
        assert_eq!(ProjectConfig::from_toml(&text).unwrap(), sample);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap().layers.len(), 2);
        assert!(matches!(
            ProjectConfig::load(dir.path().join("missing.toml")),
            Err(Error::Config(_))
        ));
    }
}
