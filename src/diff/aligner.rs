//! N-way position alignment.
//!
//! Merges per-annotator, position-sorted entry lists into one sequence of
//! [`ConfigurationSet`]s in document order. One cursor per annotator; each
//! round takes the smallest position under any cursor, pulls every entry at
//! exactly that position from every cursor, and emits one set.
//!
//! ```text
//! alice:  [0-3] [4-7]       [12-15]
//! bob:    [0-3]       [8-11][12-15]
//!           │     │     │      │
//!         set   set   set    set      (4-7 and 8-11 are incomplete)
//! ```
//!
//! Cost is one pass over all entries times the number of annotators.

use super::result::{AnnotationEntry, ConfigurationSet};
use crate::Result;
use concord_core::{Error as CoreError, Position};
use std::cmp::Ordering;
use std::iter::Peekable;
use std::vec::IntoIter;

/// An entry together with the position it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positioned {
    /// Alignment key
    pub position: Position,
    /// The annotator's entry
    pub entry: AnnotationEntry,
}

impl Positioned {
    /// Pair a position with an entry.
    #[must_use]
    pub fn new(position: Position, entry: AnnotationEntry) -> Self {
        Self { position, entry }
    }
}

/// One annotator's sorted entries for one layer.
#[derive(Debug, Clone)]
pub struct Lane {
    /// Annotator id
    pub annotator: String,
    /// Entries sorted by position
    pub entries: Vec<Positioned>,
}

impl Lane {
    /// Create a lane.
    #[must_use]
    pub fn new(annotator: impl Into<String>, entries: Vec<Positioned>) -> Self {
        Self {
            annotator: annotator.into(),
            entries,
        }
    }

    /// Sort entries by document order, then by annotation id.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            a.position
                .cmp_offsets(&b.position)
                .then_with(|| a.entry.annotation.cmp(&b.entry.annotation))
        });
    }

    fn check(&self, layer: &str) -> Result<()> {
        for p in &self.entries {
            if p.position.layer() != layer {
                return Err(CoreError::invalid_input(format!(
                    "lane '{}' holds {} while aligning layer '{}'",
                    self.annotator, p.position, layer
                ))
                .into());
            }
        }
        for w in self.entries.windows(2) {
            if w[0].position.cmp_offsets(&w[1].position) == Ordering::Greater {
                return Err(CoreError::unordered_input(format!(
                    "lane '{}': {} comes before {}",
                    self.annotator, w[0].position, w[1].position
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Align the lanes of one layer into configuration sets.
///
/// Every lane must be sorted by position (see [`Lane::sort`]); an unsorted
/// lane fails with an unordered-input error before anything is emitted.
/// Consecutive entries of one lane at the same position all land in the same
/// set, which is then stacked.
pub fn align(layer: &str, lanes: Vec<Lane>) -> Result<Vec<ConfigurationSet>> {
    for lane in &lanes {
        lane.check(layer)?;
    }

    let mut cursors: Vec<Peekable<IntoIter<Positioned>>> = lanes
        .into_iter()
        .map(|lane| lane.entries.into_iter().peekable())
        .collect();
    let mut sets = Vec::new();

    loop {
        let next = cursors
            .iter_mut()
            .filter_map(|c| c.peek().map(|p| &p.position))
            .min_by(|a, b| a.cmp_offsets(b))
            .cloned();
        let Some(position) = next else {
            break;
        };

        let mut set = ConfigurationSet::new(position.clone());
        for cursor in &mut cursors {
            while let Some(p) = cursor.next_if(|p| p.position == position) {
                set.add(p.entry);
            }
        }
        sets.push(set);
    }

    log::debug!("aligned layer '{}' into {} configuration sets", layer, sets.len());
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::result::FeatureValues;
    use concord_core::{AnnotationId, FeatureValue};

    fn item(annotator: &str, id: u64, begin: usize, end: usize, tag: &str) -> Positioned {
        let mut values = FeatureValues::new();
        values.insert("tag".into(), FeatureValue::from(tag));
        Positioned::new(
            Position::span("pos", begin, end).unwrap(),
            AnnotationEntry::new(annotator, AnnotationId(id), values),
        )
    }

    #[test]
    fn test_empty_lanes() {
        let sets = align("pos", vec![Lane::new("a", vec![]), Lane::new("b", vec![])]).unwrap();
        assert!(sets.is_empty());
        assert!(align("pos", vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_preserves_document_order() {
        let a = Lane::new("a", vec![item("a", 1, 0, 3, "X"), item("a", 2, 4, 7, "Y"), item("a", 3, 12, 15, "Z")]);
        let b = Lane::new("b", vec![item("b", 1, 0, 3, "X"), item("b", 2, 8, 11, "Y"), item("b", 3, 12, 15, "Z")]);
        let sets = align("pos", vec![a, b]).unwrap();
        let order: Vec<String> = sets.iter().map(|s| s.position().to_string()).collect();
        assert_eq!(order, vec!["pos[0-3]", "pos[4-7]", "pos[8-11]", "pos[12-15]"]);
        assert_eq!(sets[0].annotators().len(), 2);
        assert_eq!(sets[1].annotators().len(), 1);
        assert_eq!(sets[2].annotators().len(), 1);
    }

    #[test]
    fn test_zero_width_before_wider() {
        let a = Lane::new("a", vec![item("a", 1, 5, 5, "E"), item("a", 2, 5, 9, "W")]);
        let b = Lane::new("b", vec![item("b", 1, 5, 9, "W")]);
        let sets = align("pos", vec![a, b]).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].position().primary().len(), 0);
        assert!(sets[1].covers(&["a", "b"]));
    }

    #[test]
    fn test_stacked_entries_share_a_set() {
        let a = Lane::new("a", vec![item("a", 1, 0, 3, "X"), item("a", 2, 0, 3, "Y")]);
        let b = Lane::new("b", vec![item("b", 1, 0, 3, "X")]);
        let sets = align("pos", vec![a, b]).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_stacked());
        assert!(sets[0].stacked_annotators().contains("a"));
    }

    #[test]
    fn test_unsorted_lane_fails_fast() {
        let a = Lane::new("a", vec![item("a", 1, 4, 7, "X"), item("a", 2, 0, 3, "Y")]);
        let err = align("pos", vec![a]).unwrap_err();
        assert!(err.to_string().contains("Unordered"));
    }

    #[test]
    fn test_wrong_layer_rejected() {
        let mut p = item("a", 1, 0, 3, "X");
        p.position = Position::span("ne", 0, 3).unwrap();
        assert!(align("pos", vec![Lane::new("a", vec![p])]).is_err());
    }

    #[test]
    fn test_sort_then_align() {
        let mut a = Lane::new("a", vec![item("a", 2, 4, 7, "Y"), item("a", 1, 0, 3, "X")]);
        a.sort();
        assert_eq!(align("pos", vec![a]).unwrap().len(), 2);
    }
}
