//! MemTable implementation
//!
//! SkipMap-based memtable with an atomic byte-size counter.

use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_skiplist::SkipMap;

use crate::entry::{Cell, Key};

/// Concurrent sorted buffer holding the most recent un-flushed writes.
///
/// At most one cell per key: `upsert` replaces any prior cell, so a write
/// after a delete "undeletes" and a delete after a write tombstones. Two
/// concurrent upserts to the same key resolve to last-write-wins with no
/// defined order between them.
pub struct MemTable {
    /// Sorted map from key to its most recent cell (tombstones included).
    cells: SkipMap<Key, Cell>,

    /// Cumulative key+value bytes absorbed since the last `clear`.
    /// Monotonic between clears: an overwrite adds its full size again.
    /// Advisory only; the caller compares it against its flush threshold.
    byte_size: AtomicU64,
}

impl MemTable {
    /// Create a new, empty memtable.
    pub fn new() -> Self {
        Self {
            cells: SkipMap::new(),
            byte_size: AtomicU64::new(0),
        }
    }

    /// Insert or replace the cell for `cell.key()`.
    pub fn upsert(&self, cell: Cell) {
        let added = cell.key().len() as u64 + cell.value_size();
        self.byte_size.fetch_add(added, Ordering::Relaxed);
        self.cells.insert(cell.key().clone(), cell);
    }

    /// Point lookup. `None` means "not present in this memtable"; the
    /// caller must still consult older runs. A tombstone is a present cell
    /// with `is_tombstone() == true`, not `None`.
    pub fn get_cell(&self, key: &[u8]) -> Option<Cell> {
        self.cells.get(key).map(|entry| entry.value().clone())
    }

    /// Smallest key greater than or equal to `key`.
    pub fn ceiling_key(&self, key: &[u8]) -> Option<Key> {
        self.cells
            .lower_bound(Bound::Included(key))
            .map(|entry| entry.key().clone())
    }

    /// Lazy ascending sequence of cells in `[from, to)`; `None` bounds are
    /// unbounded. Live view: upserts racing the iteration may or may not
    /// be observed.
    pub fn range<'a>(
        &'a self,
        from: Option<&'a [u8]>,
        to: Option<&'a [u8]>,
    ) -> impl Iterator<Item = Cell> + 'a {
        let lower = from.map_or(Bound::Unbounded, Bound::Included);
        let upper = to.map_or(Bound::Unbounded, Bound::Excluded);
        self.cells
            .range::<[u8], _>((lower, upper))
            .map(|entry| entry.value().clone())
    }

    /// Cumulative byte size since the last clear.
    pub fn byte_size(&self) -> u64 {
        self.byte_size.load(Ordering::Relaxed)
    }

    /// Number of distinct keys currently held.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reset to empty. Called right after a successful flush, under the
    /// engine's exclusive flush gate so no concurrent upsert is dropped.
    pub fn clear(&self) {
        while self.cells.pop_front().is_some() {}
        self.byte_size.store(0, Ordering::Relaxed);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
