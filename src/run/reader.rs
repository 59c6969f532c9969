//! Run reader
//!
//! Opens a run file, maps it read-only through the engine's arena, and
//! serves point lookups and bounded range cursors by binary search over the
//! mapped index region.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use memmap2::Mmap;

use crate::compare::key_cmp;
use crate::entry::{Cell, Entry, Key};
use crate::error::{Result, StrataError};
use crate::iter::MergeCursor;

use super::{MapArena, FOOTER_SIZE, INDEX_RECORD_SIZE, OFFSET_SIZE};

/// Immutable, memory-mapped sorted run.
///
/// Point access is O(log rows); a k-row range scan is O(log rows + k).
/// Row-index arguments out of `0..rows` are invariant violations and panic.
pub struct Run {
    path: PathBuf,
    /// Mapping shared with the arena; keeps the view alive for this run's
    /// whole life regardless of when the arena is closed.
    map: Arc<Mmap>,
    /// Byte offset where the data region ends and the index region begins.
    index_offset: usize,
    rows: usize,
    /// Recency number: higher = more recently flushed.
    number: u64,
}

impl Run {
    /// Open and validate a run file.
    ///
    /// Rejects files whose footer or index region does not add up exactly
    /// (truncated files, foreign files, out-of-bounds offsets) rather than
    /// silently returning wrong data.
    pub fn open(path: &Path, number: u64, arena: &MapArena) -> Result<Self> {
        let file = File::open(path).map_err(|e| StrataError::io(path, e))?;
        let map = arena.map_file(&file, path)?;

        if map.len() < FOOTER_SIZE + INDEX_RECORD_SIZE {
            return Err(StrataError::malformed(
                path,
                format!(
                    "file is {} bytes, smaller than footer plus sentinel record",
                    map.len()
                ),
            ));
        }

        let footer_offset = map.len() - FOOTER_SIZE;
        let index_offset = read_u64(&map, footer_offset) as usize;
        let index_byte_size = read_u64(&map, footer_offset + OFFSET_SIZE) as usize;

        if index_byte_size < INDEX_RECORD_SIZE || index_byte_size % INDEX_RECORD_SIZE != 0 {
            return Err(StrataError::malformed(
                path,
                format!("index region size {} is not a record multiple", index_byte_size),
            ));
        }
        if index_offset
            .checked_add(index_byte_size)
            .map_or(true, |end| end != footer_offset)
        {
            return Err(StrataError::malformed(
                path,
                format!(
                    "index region [{}, +{}) does not meet the footer at {}",
                    index_offset, index_byte_size, footer_offset
                ),
            ));
        }

        let rows = index_byte_size / INDEX_RECORD_SIZE - 1;
        let run = Self {
            path: path.to_path_buf(),
            map,
            index_offset,
            rows,
            number,
        };
        run.validate_index()?;

        tracing::debug!(path = %run.path.display(), number, rows, "opened run");
        Ok(run)
    }

    /// Check every index record bounds a real slice of the data region:
    /// offsets must be monotone and end exactly at the index region, and
    /// the sentinel must be `(end_of_data, 0)`.
    fn validate_index(&self) -> Result<()> {
        if self.sentinel_key_offset() != self.index_offset as u64
            || self.value_offset_raw(self.rows) != 0
        {
            return Err(StrataError::malformed(
                &self.path,
                "sentinel record does not close the data region",
            ));
        }
        let mut previous_end = 0u64;
        for row in 0..self.rows {
            let key_offset = self.key_offset(row);
            let value_offset = self.value_offset_raw(row).unsigned_abs();
            let next_key_offset = if row + 1 < self.rows {
                self.key_offset(row + 1)
            } else {
                self.sentinel_key_offset()
            };
            if key_offset != previous_end || value_offset < key_offset || next_key_offset < value_offset
            {
                return Err(StrataError::malformed(
                    &self.path,
                    format!("index record {} does not bound the data region", row),
                ));
            }
            previous_end = next_key_offset;
        }
        Ok(())
    }

    /// Number of rows in this run.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Recency number assigned at flush time.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key bytes of row `i`.
    pub fn key_at(&self, i: usize) -> &[u8] {
        assert!(i < self.rows, "row {} out of range ({} rows)", i, self.rows);
        let key_offset = self.key_offset(i) as usize;
        let value_offset = self.value_offset_raw(i).unsigned_abs() as usize;
        &self.map[key_offset..value_offset]
    }

    /// Value bytes of row `i`; `None` when the row is a tombstone.
    pub fn value_at(&self, i: usize) -> Option<&[u8]> {
        assert!(i < self.rows, "row {} out of range ({} rows)", i, self.rows);
        let raw = self.value_offset_raw(i);
        if raw < 0 {
            return None;
        }
        let next_key_offset = if i + 1 < self.rows {
            self.key_offset(i + 1) as usize
        } else {
            self.sentinel_key_offset() as usize
        };
        Some(&self.map[raw as usize..next_key_offset])
    }

    /// Owned cell for row `i`.
    pub fn cell_at(&self, i: usize) -> Cell {
        let key = Bytes::copy_from_slice(self.key_at(i));
        match self.value_at(i) {
            Some(value) => Cell::from(Entry::put(key, Bytes::copy_from_slice(value))),
            None => Cell::from(Entry::tombstone(key)),
        }
    }

    /// Index of the first row whose key is greater than or equal to `key`
    /// (`rows()` when every key is smaller).
    pub fn lower_bound(&self, key: &[u8]) -> usize {
        let mut low = 0;
        let mut high = self.rows;
        while low < high {
            let mid = low + (high - low) / 2;
            if key_cmp(self.key_at(mid), key) == std::cmp::Ordering::Less {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Point lookup: binary search, then verify exact equality.
    pub fn get_cell(&self, key: &[u8]) -> Option<Cell> {
        let row = self.lower_bound(key);
        if row < self.rows && key_cmp(self.key_at(row), key) == std::cmp::Ordering::Equal {
            Some(self.cell_at(row))
        } else {
            None
        }
    }

    /// Smallest stored key greater than or equal to `key`.
    pub fn ceiling_key(&self, key: &[u8]) -> Option<Key> {
        let row = self.lower_bound(key);
        if row < self.rows {
            Some(Bytes::copy_from_slice(self.key_at(row)))
        } else {
            None
        }
    }

    /// Cursor over `[from, to)`, tagged with this run's recency number.
    /// Takes the run by `Arc` so the cursor can outlive the caller's
    /// borrow of the run set.
    pub fn range_cursor(
        self: Arc<Self>,
        from: Option<&[u8]>,
        to: Option<&[u8]>,
    ) -> MergeCursor<'static> {
        let start = from.map_or(0, |key| self.lower_bound(key));
        let end = to.map_or(self.rows, |key| self.lower_bound(key));
        let number = self.number;
        let range = RunRange {
            run: self,
            row: start,
            end: end.max(start),
        };
        MergeCursor::new(number, Box::new(range))
    }

    fn key_offset(&self, row: usize) -> u64 {
        read_u64(&self.map, self.index_offset + 2 * row * OFFSET_SIZE)
    }

    fn value_offset_raw(&self, row: usize) -> i64 {
        read_i64(&self.map, self.index_offset + (2 * row + 1) * OFFSET_SIZE)
    }

    fn sentinel_key_offset(&self) -> u64 {
        read_u64(&self.map, self.index_offset + 2 * self.rows * OFFSET_SIZE)
    }
}

/// Ascending iterator over one run's rows in `[row, end)`.
struct RunRange {
    run: Arc<Run>,
    row: usize,
    end: usize,
}

impl Iterator for RunRange {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.row >= self.end {
            return None;
        }
        let cell = self.run.cell_at(self.row);
        self.row += 1;
        Some(cell)
    }
}

fn read_u64(map: &Mmap, offset: usize) -> u64 {
    u64::from_ne_bytes(map[offset..offset + OFFSET_SIZE].try_into().unwrap())
}

fn read_i64(map: &Mmap, offset: usize) -> i64 {
    i64::from_ne_bytes(map[offset..offset + OFFSET_SIZE].try_into().unwrap())
}
