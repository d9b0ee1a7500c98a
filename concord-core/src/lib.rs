//! # concord-core
//!
//! Core types for concord: shared data structures used across the workspace.
//!
//! This crate provides:
//! - **Positions**: `Offsets`, `Position` (span and arc alignment keys)
//! - **Annotation store**: `AnnotatedDocument`, `Annotation`, `FeatureValue`
//! - **Layer descriptions**: `LayerSpec`, `LayerKind`
//!
//! The `concord` crate builds the diff and agreement engine on top of these.

#![warn(missing_docs)]

pub mod annotation;
pub mod error;
pub mod layer;
pub mod position;

pub use annotation::{AnnotatedDocument, Annotation, AnnotationBuilder, AnnotationId, FeatureValue};
pub use error::{Error, Result};
pub use layer::{LayerKind, LayerSpec};
pub use position::{Offsets, Position};
