//! K-way merge iterator
//!
//! Merges every cursor into one ascending sequence of live cells. For any
//! key present in at least one source, exactly zero or one cell is emitted:
//! zero when the most recent version is a tombstone, otherwise the most
//! recent live version. Output keys are strictly ascending.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::compare::key_cmp;
use crate::entry::{Cell, Key};

use super::MergeCursor;

/// Priority-ordered merge across all sources of a range read.
pub struct MergeIterator<'a> {
    heap: BinaryHeap<OrderedCursor<'a>>,
    /// Key of the last row resolved (emitted or consumed as a tombstone);
    /// every equal-keyed cell still queued is a stale older version.
    last_key: Option<Key>,
}

impl<'a> MergeIterator<'a> {
    /// Seed the merge with one cursor per source; exhausted cursors are
    /// dropped up front.
    pub fn new(cursors: Vec<MergeCursor<'a>>) -> Self {
        let heap = cursors
            .into_iter()
            .filter(|cursor| !cursor.is_exhausted())
            .map(OrderedCursor)
            .collect();
        Self {
            heap,
            last_key: None,
        }
    }
}

impl Iterator for MergeIterator<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        while let Some(mut top) = self.heap.pop() {
            let Some(cell) = top.0.advance() else {
                continue;
            };
            if !top.0.is_exhausted() {
                self.heap.push(top);
            }

            let authoritative = match &self.last_key {
                None => true,
                Some(last) => key_cmp(cell.key(), last) == Ordering::Greater,
            };
            if !authoritative {
                // Stale older version of a key already resolved.
                continue;
            }

            self.last_key = Some(cell.key().clone());
            if !cell.is_tombstone() {
                return Some(cell);
            }
            // Tombstone: the key is resolved as deleted; emit nothing.
        }
        None
    }
}

/// Heap adapter: `BinaryHeap` is a max-heap, so the ordering is reversed on
/// keys: the cursor with the smallest next key is popped first, and for
/// equal keys the higher recency (newer source) wins.
struct OrderedCursor<'a>(MergeCursor<'a>);

impl Ord for OrderedCursor<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.peek(), other.0.peek()) {
            (Some(a), Some(b)) => {
                key_cmp(b, a).then_with(|| self.0.recency().cmp(&other.0.recency()))
            }
            // Exhausted cursors sink; the merge never re-inserts them.
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}

impl PartialOrd for OrderedCursor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderedCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedCursor<'_> {}
