//! Command implementations for the concord CLI
//!
//! Each command has its own module.

pub mod agreement;
pub mod config;
pub mod diff;
pub mod validate;

pub use agreement::AgreementArgs;
pub use config::{ConfigAction, ConfigArgs};
pub use diff::DiffArgs;
pub use validate::ValidateArgs;

use crate::{AnnotatedDocument, ProjectConfig};
use std::path::Path;

/// Load the config given with `-c`, or the default one.
pub(crate) fn load_config(path: Option<&str>) -> Result<ProjectConfig, String> {
    ProjectConfig::load_or_default(path.map(Path::new)).map_err(|e| e.to_string())
}

/// Load one document per file.
pub(crate) fn load_documents(files: &[String]) -> Result<Vec<AnnotatedDocument>, String> {
    files
        .iter()
        .map(|f| AnnotatedDocument::load(f).map_err(|e| format!("{}: {}", f, e)))
        .collect()
}
