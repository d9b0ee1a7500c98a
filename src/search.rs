//! Annotation index and the per-project index registry.
//!
//! An [`AnnotationIndex`] answers "where does feature `f` of layer `l` have
//! value `v`?" with hits grouped by document. Those hits are what the
//! [`bulk`](crate::bulk) operator consumes.
//!
//! The [`IndexRegistry`] keeps at most one open index per project behind a
//! single mutex. Indexes are handed out as `Arc`s, so a lookup never holds
//! the registry lock while the caller searches.

use crate::sync::{lock, try_lock, Mutex};
use crate::Result;
use concord_core::{AnnotatedDocument, FeatureValue, Offsets};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Project identifier.
pub type ProjectId = u64;

/// One matching span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hit {
    /// Document name
    pub document: String,
    /// Matched offsets
    pub offsets: Offsets,
}

impl Hit {
    /// Create a hit.
    #[must_use]
    pub fn new(document: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            document: document.into(),
            offsets: Offsets::new(begin, end),
        }
    }
}

/// Hits grouped by document name; offsets in document order.
pub type HitsByDocument = BTreeMap<String, Vec<Offsets>>;

/// Group loose hits by document, sorting each group.
pub fn group_hits(hits: impl IntoIterator<Item = Hit>) -> HitsByDocument {
    let mut grouped = HitsByDocument::new();
    for hit in hits {
        grouped.entry(hit.document).or_default().push(hit.offsets);
    }
    for offsets in grouped.values_mut() {
        offsets.sort();
    }
    grouped
}

type IndexKey = (String, String, FeatureValue);

/// In-memory inverted index over span features.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    postings: BTreeMap<IndexKey, HitsByDocument>,
    documents: BTreeMap<String, usize>,
}

impl AnnotationIndex {
    /// Empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index built from `documents`.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a AnnotatedDocument>) -> Self {
        let mut index = Self::new();
        for doc in documents {
            index.index_document(doc);
        }
        index
    }

    /// Add (or re-add) one document. Null feature values are not indexed.
    pub fn index_document(&mut self, document: &AnnotatedDocument) {
        if self.documents.contains_key(&document.name) {
            self.remove_document(&document.name);
        }
        let mut local: BTreeMap<IndexKey, Vec<Offsets>> = BTreeMap::new();
        let mut count = 0;
        for ann in document.annotations() {
            for (feature, value) in &ann.features {
                if value.is_null() {
                    continue;
                }
                local
                    .entry((ann.layer.clone(), feature.clone(), value.clone()))
                    .or_default()
                    .push(ann.offsets());
                count += 1;
            }
        }
        for (key, mut offsets) in local {
            offsets.sort_unstable();
            self.postings
                .entry(key)
                .or_default()
                .insert(document.name.clone(), offsets);
        }
        self.documents.insert(document.name.clone(), count);
    }

    /// Drop every posting of `document`. Returns false if it was not indexed.
    pub fn remove_document(&mut self, document: &str) -> bool {
        if self.documents.remove(document).is_none() {
            return false;
        }
        self.postings.retain(|_, by_doc| {
            by_doc.remove(document);
            !by_doc.is_empty()
        });
        true
    }

    /// Hits where `layer.feature == value`.
    #[must_use]
    pub fn search(&self, layer: &str, feature: &str, value: &FeatureValue) -> HitsByDocument {
        self.postings
            .get(&(layer.to_string(), feature.to_string(), value.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Indexed document names.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Number of indexed feature values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.values().sum()
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Open indexes keyed by project.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: Mutex<HashMap<ProjectId, Arc<AnnotationIndex>>>,
}

impl IndexRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the index of `project`, building it with `build` if it is not
    /// open yet. The build runs under the registry lock, so concurrent
    /// openers of one project build it once.
    pub fn open<F>(&self, project: ProjectId, build: F) -> Result<Arc<AnnotationIndex>>
    where
        F: FnOnce() -> Result<AnnotationIndex>,
    {
        let mut indexes = lock(&self.indexes);
        if let Some(index) = indexes.get(&project) {
            log::warn!("index for project {} is already open", project);
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(build()?);
        log::debug!("opened index for project {} ({} values)", project, index.len());
        indexes.insert(project, Arc::clone(&index));
        Ok(index)
    }

    /// Install `index` for `project`, returning the one it replaces.
    pub fn replace(&self, project: ProjectId, index: AnnotationIndex) -> Option<Arc<AnnotationIndex>> {
        lock(&self.indexes).insert(project, Arc::new(index))
    }

    /// Close the index of `project`. Returns false if none was open.
    pub fn close(&self, project: ProjectId) -> bool {
        let closed = lock(&self.indexes).remove(&project).is_some();
        if closed {
            log::debug!("closed index for project {}", project);
        }
        closed
    }

    /// Open index of `project`.
    #[must_use]
    pub fn lookup(&self, project: ProjectId) -> Option<Arc<AnnotationIndex>> {
        lock(&self.indexes).get(&project).cloned()
    }

    /// Like [`IndexRegistry::lookup`] but fails instead of waiting for the lock.
    pub fn try_lookup(&self, project: ProjectId) -> Result<Option<Arc<AnnotationIndex>>> {
        Ok(try_lock(&self.indexes)?.get(&project).cloned())
    }

    /// True if `project` has an open index.
    #[must_use]
    pub fn is_open(&self, project: ProjectId) -> bool {
        lock(&self.indexes).contains_key(&project)
    }

    /// Projects with an open index, sorted.
    #[must_use]
    pub fn open_projects(&self) -> Vec<ProjectId> {
        let mut projects: Vec<ProjectId> = lock(&self.indexes).keys().copied().collect();
        projects.sort_unstable();
        projects
    }
}
