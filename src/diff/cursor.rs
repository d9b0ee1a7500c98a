//! Two-list cursor and overlap detection.
//!
//! [`DoubleCursor`] walks two sorted lists side by side. It counts every
//! step, and it can *ignore* elements of one side (elements already consumed
//! by an earlier pass) without moving the other side.
//!
//! On top of it:
//! - [`overlapping_pairs`]: every overlapping `(a, b)` pair, by a sweep that
//!   keeps only still-open intervals active, so cost is linear in the input
//!   plus the number of pairs reported.
//! - [`pair_markables`]: one-to-one pairing of two annotators' markables,
//!   exact matches first, then overlaps.
//!
//! The overlap predicate is [`Offsets::overlaps`].

use crate::Result;
use concord_core::{Error as CoreError, Offsets};
use std::cmp::Ordering;

/// Cursor over two slices.
#[derive(Debug, Clone)]
pub struct DoubleCursor<'a, T> {
    a: &'a [T],
    b: &'a [T],
    pos_a: usize,
    pos_b: usize,
    ignored_a: Vec<bool>,
    ignored_b: Vec<bool>,
    steps: usize,
}

impl<'a, T> DoubleCursor<'a, T> {
    /// Cursor at the start of both slices.
    #[must_use]
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        Self {
            a,
            b,
            pos_a: 0,
            pos_b: 0,
            ignored_a: vec![false; a.len()],
            ignored_b: vec![false; b.len()],
            steps: 0,
        }
    }

    /// Current element of the left side, with its index.
    #[must_use]
    pub fn current_a(&self) -> Option<(usize, &'a T)> {
        self.a.get(self.pos_a).map(|x| (self.pos_a, x))
    }

    /// Current element of the right side, with its index.
    #[must_use]
    pub fn current_b(&self) -> Option<(usize, &'a T)> {
        self.b.get(self.pos_b).map(|x| (self.pos_b, x))
    }

    /// Advance the left side past its current element.
    pub fn step_a(&mut self) {
        if self.pos_a < self.a.len() {
            self.pos_a += 1;
            self.steps += 1;
            self.skip_ignored_a();
        }
    }

    /// Advance the right side past its current element.
    pub fn step_b(&mut self) {
        if self.pos_b < self.b.len() {
            self.pos_b += 1;
            self.steps += 1;
            self.skip_ignored_b();
        }
    }

    /// Mark a left element as consumed. The cursor never stops on it; if it
    /// is the current element the left side moves on, the right side stays,
    /// and no step is counted.
    pub fn ignore_a(&mut self, index: usize) {
        if let Some(flag) = self.ignored_a.get_mut(index) {
            *flag = true;
            self.skip_ignored_a();
        }
    }

    /// Right-side counterpart of [`DoubleCursor::ignore_a`].
    pub fn ignore_b(&mut self, index: usize) {
        if let Some(flag) = self.ignored_b.get_mut(index) {
            *flag = true;
            self.skip_ignored_b();
        }
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// True once both sides are exhausted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pos_a >= self.a.len() && self.pos_b >= self.b.len()
    }

    fn skip_ignored_a(&mut self) {
        while self.ignored_a.get(self.pos_a).copied().unwrap_or(false) {
            self.pos_a += 1;
        }
    }

    fn skip_ignored_b(&mut self) {
        while self.ignored_b.get(self.pos_b).copied().unwrap_or(false) {
            self.pos_b += 1;
        }
    }
}

/// Result of [`overlapping_pairs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapScan {
    /// Overlapping `(left index, right index)` pairs, sorted
    pub pairs: Vec<(usize, usize)>,
    /// Cursor steps taken (always `a.len() + b.len()`)
    pub steps: usize,
}

fn check_sorted(side: &str, items: &[Offsets]) -> Result<()> {
    if let Some((i, bad)) = items.iter().enumerate().find(|(_, o)| o.begin > o.end) {
        return Err(CoreError::invalid_position(format!("{} list item {}: {}", side, i, bad)).into());
    }
    if let Some(i) = items.windows(2).position(|w| w[0] > w[1]) {
        return Err(CoreError::unordered_input(format!(
            "{} list: {} at {} comes before {}",
            side,
            items[i],
            i,
            items[i + 1]
        ))
        .into());
    }
    Ok(())
}

/// Drop active intervals that can no longer overlap anything starting at
/// or after `at.begin`.
fn evict(active: &mut Vec<usize>, items: &[Offsets], at: Offsets) {
    active.retain(|&k| {
        let y = items[k];
        y.begin == at.begin || y.end > at.begin
    });
}

enum Side {
    Left,
    Right,
}

/// Every overlapping pair between two lists sorted by (begin, end).
///
/// The two lists are merged by begin offset. Each side keeps the intervals
/// that may still overlap upcoming ones; when an interval is taken from one
/// side, every remaining active interval of the other side overlaps it.
pub fn overlapping_pairs(a: &[Offsets], b: &[Offsets]) -> Result<OverlapScan> {
    check_sorted("left", a)?;
    check_sorted("right", b)?;

    let mut cursor = DoubleCursor::new(a, b);
    let mut active_a: Vec<usize> = Vec::new();
    let mut active_b: Vec<usize> = Vec::new();
    let mut pairs = Vec::new();

    loop {
        let (side, idx, x) = match (cursor.current_a(), cursor.current_b()) {
            (Some((i, x)), Some((_, y))) if x.begin <= y.begin => (Side::Left, i, *x),
            (_, Some((j, y))) => (Side::Right, j, *y),
            (Some((i, x)), None) => (Side::Left, i, *x),
            (None, None) => break,
        };
        match side {
            Side::Left => {
                evict(&mut active_b, b, x);
                pairs.extend(active_b.iter().map(|&j| (idx, j)));
                active_a.push(idx);
                cursor.step_a();
            }
            Side::Right => {
                evict(&mut active_a, a, x);
                pairs.extend(active_a.iter().map(|&i| (i, idx)));
                active_b.push(idx);
                cursor.step_b();
            }
        }
    }

    pairs.sort_unstable();
    Ok(OverlapScan {
        pairs,
        steps: cursor.step_count(),
    })
}

/// One-to-one pairing of two sorted markable lists.
///
/// Exact boundary matches are paired first. The remaining markables are
/// paired greedily in document order when they overlap; an unmatched
/// markable is skipped on the side that ends first.
pub fn pair_markables(a: &[Offsets], b: &[Offsets]) -> Result<Vec<(usize, usize)>> {
    check_sorted("left", a)?;
    check_sorted("right", b)?;

    let mut pairs = Vec::new();
    let mut exact = DoubleCursor::new(a, b);
    while let (Some((i, x)), Some((j, y))) = (exact.current_a(), exact.current_b()) {
        match x.cmp(y) {
            Ordering::Equal => {
                pairs.push((i, j));
                exact.step_a();
                exact.step_b();
            }
            Ordering::Less => exact.step_a(),
            Ordering::Greater => exact.step_b(),
        }
    }

    let mut cursor = DoubleCursor::new(a, b);
    for &(i, j) in &pairs {
        cursor.ignore_a(i);
        cursor.ignore_b(j);
    }
    while let (Some((i, x)), Some((j, y))) = (cursor.current_a(), cursor.current_b()) {
        if x.overlaps(y) {
            pairs.push((i, j));
            cursor.step_a();
            cursor.step_b();
        } else if y.begin >= x.end {
            cursor.step_a();
        } else {
            cursor.step_b();
        }
    }

    pairs.sort_unstable();
    Ok(pairs)
}
