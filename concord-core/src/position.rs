//! Alignment keys: offsets and positions.
//!
//! A [`Position`] identifies "the same slot" across annotators. Two
//! annotations from different annotators align when their positions are
//! equal; positions never carry identity of the underlying annotation.
//!
//! ```text
//! Span position:  (layer, begin, end)
//! Arc position:   (layer, source(begin, end), target(begin, end))
//! ```
//!
//! Ordering is document order: begin, then end. A zero-width interval sorts
//! before any wider interval starting at the same offset.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Half-open character range `[begin, end)`.
///
/// `begin == end` is a valid zero-width range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Offsets {
    /// Start offset (inclusive)
    pub begin: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Offsets {
    /// Create offsets without validation.
    ///
    /// Use [`Offsets::try_new`] for offsets coming from outside the crate.
    #[must_use]
    pub const fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Create offsets, rejecting `begin > end`.
    pub fn try_new(begin: usize, end: usize) -> Result<Self> {
        if begin > end {
            return Err(Error::invalid_position(format!(
                "begin {} is after end {}",
                begin, end
            )));
        }
        Ok(Self { begin, end })
    }

    /// Length in characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// True for zero-width ranges.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Overlap predicate used throughout the diff engine.
    ///
    /// Two ranges overlap when they start at the same offset, or when each
    /// starts before the other ends. A zero-width range therefore overlaps a
    /// range that starts at the same offset or strictly contains it, but not
    /// one that merely ends where it sits.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.begin == other.begin || (self.begin < other.end && other.begin < self.end)
    }
}

impl fmt::Display for Offsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

impl From<(usize, usize)> for Offsets {
    fn from((begin, end): (usize, usize)) -> Self {
        Self::new(begin, end)
    }
}

/// Alignment key for one annotation slot of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Position {
    /// Span-like annotation: identified by its own offsets.
    Span {
        /// Layer (annotation type) name
        layer: String,
        /// Span offsets
        offsets: Offsets,
    },
    /// Relation-like annotation: identified by the offsets of its endpoints.
    Arc {
        /// Layer (annotation type) name
        layer: String,
        /// Offsets of the source (governor) span
        source: Offsets,
        /// Offsets of the target (dependent) span
        target: Offsets,
    },
}

impl Position {
    /// Create a span position, rejecting `begin > end`.
    pub fn span(layer: impl Into<String>, begin: usize, end: usize) -> Result<Self> {
        Ok(Position::Span {
            layer: layer.into(),
            offsets: Offsets::try_new(begin, end)?,
        })
    }

    /// Create an arc position from already validated endpoint offsets.
    pub fn arc(layer: impl Into<String>, source: Offsets, target: Offsets) -> Result<Self> {
        let source = Offsets::try_new(source.begin, source.end)?;
        let target = Offsets::try_new(target.begin, target.end)?;
        Ok(Position::Arc {
            layer: layer.into(),
            source,
            target,
        })
    }

    /// Layer this position belongs to.
    #[must_use]
    pub fn layer(&self) -> &str {
        match self {
            Position::Span { layer, .. } | Position::Arc { layer, .. } => layer,
        }
    }

    /// Offsets that drive document order: the span itself or the arc source.
    #[must_use]
    pub fn primary(&self) -> Offsets {
        match self {
            Position::Span { offsets, .. } => *offsets,
            Position::Arc { source, .. } => *source,
        }
    }

    /// Target offsets for arcs.
    #[must_use]
    pub fn target(&self) -> Option<Offsets> {
        match self {
            Position::Span { .. } => None,
            Position::Arc { target, .. } => Some(*target),
        }
    }

    /// True for arc positions.
    #[must_use]
    pub fn is_arc(&self) -> bool {
        matches!(self, Position::Arc { .. })
    }

    /// Compare two positions by document order only, ignoring the layer.
    #[must_use]
    pub fn cmp_offsets(&self, other: &Self) -> Ordering {
        self.primary()
            .cmp(&other.primary())
            .then_with(|| self.is_arc().cmp(&other.is_arc()))
            .then_with(|| self.target().cmp(&other.target()))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.layer()
            .cmp(other.layer())
            .then_with(|| self.cmp_offsets(other))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Span { layer, offsets } => write!(f, "{}[{}]", layer, offsets),
            Position::Arc {
                layer,
                source,
                target,
            } => write!(f, "{}[{} -> {}]", layer, source, target),
        }
    }
}
