//! # concord
//!
//! Multi-annotator diff and inter-annotator agreement.
//!
//! Several annotators annotate the same document. concord lines their
//! annotations up by position, tells you where they agree, where they
//! disagree and where someone left a gap, and measures how far the
//! agreement exceeds chance.
//!
//! - **Diff**: N-way alignment of span and relation layers ([`diff`])
//! - **Agreement**: Cohen's kappa, Fleiss' kappa, percent agreement ([`agreement`])
//! - **Overlap**: two-list cursor and linear overlap sweep ([`diff::cursor`])
//! - **Bulk edits**: create/override/delete at many hits ([`bulk`])
//! - **Index registry**: per-project annotation indexes ([`search`])
//!
//! ## Quick Start
//!
//! ```rust
//! use concord::agreement::{agreement, AgreementOptions};
//! use concord::{AnnotatedDocument, Differ, LayerSpec};
//!
//! let text = "The cat sat";
//! let mut alice = AnnotatedDocument::new("doc1", "alice", text);
//! let mut bob = alice.blank_copy("bob");
//! for (doc, verb) in [(&mut alice, "VBD"), (&mut bob, "VBN")] {
//!     doc.add_span("pos", 0, 3, "PosValue", "DT").unwrap();
//!     doc.add_span("pos", 4, 7, "PosValue", "NN").unwrap();
//!     doc.add_span("pos", 8, 11, "PosValue", verb).unwrap();
//! }
//!
//! let differ = Differ::from_specs(&[LayerSpec::span("pos", ["PosValue"])]).unwrap();
//! let result = differ.diff_all(&[&alice, &bob]).unwrap();
//! assert_eq!(result.summary().complete_differing, 1);
//!
//! let kappa = agreement(&result, &AgreementOptions::new("pos", "PosValue")).unwrap();
//! assert!(kappa.value < 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Effect                                          |
//! |-------------|---------|-------------------------------------------------|
//! | `cli`       | yes     | the `concord` binary                            |
//! | `fast-lock` | no      | `parking_lot` mutex for the index registry      |
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade and never installs a
//! logger. The binary routes records to stderr.

#![warn(missing_docs)]

pub mod agreement;
pub mod bulk;
pub mod config;
pub mod diff;
mod error;
pub mod search;
pub mod sync;

#[cfg(feature = "cli")]
pub mod cli;

pub use agreement::{agreement, pairwise_agreement, AgreementOptions, AgreementResult, Measure};
pub use bulk::{BulkAction, BulkOperator, BulkOptions, BulkReport};
pub use config::ProjectConfig;
pub use diff::{AdapterSet, DiffAdapter, DiffResult, Differ};
pub use error::{Error, Result};
pub use search::{AnnotationIndex, IndexRegistry};

pub use concord_core::{
    AnnotatedDocument, Annotation, AnnotationBuilder, AnnotationId, FeatureValue, LayerKind,
    LayerSpec, Offsets, Position,
};
