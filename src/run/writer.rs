//! Run writer (flush path)
//!
//! Streams a memtable snapshot into a new run file in the on-disk format
//! described in the module documentation.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::entry::Cell;
use crate::error::{Result, StrataError};

use super::INDEX_RECORD_SIZE;

/// Builder for a new run file.
///
/// Call `add()` once per cell in ascending key order, then `finish()` to
/// append the index region and footer. Dropping the writer without
/// `finish()` leaves an incomplete file that is never registered; the pool
/// removes it.
pub struct RunWriter {
    /// Output file path, carried for error context.
    path: PathBuf,
    writer: BufWriter<File>,
    /// Index records accumulated while the data region streams out.
    /// The value offset is already negated for tombstones.
    index: Vec<(u64, i64)>,
    /// Bytes of data region written so far; doubles as the next key offset.
    data_offset: u64,
}

impl RunWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| StrataError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            index: Vec::new(),
            data_offset: 0,
        })
    }

    /// Append one cell (must be called in ascending key order).
    ///
    /// A tombstone contributes its key bytes only; its index record stores
    /// the negated value offset. A tombstone at row 0 with an empty key
    /// would encode `-0 = 0` and read back as a live empty value, an
    /// inherent blind spot of the negation encoding, unreachable for any
    /// non-empty key.
    pub fn add(&mut self, cell: &Cell) -> Result<()> {
        let key_offset = self.data_offset;
        let value_offset = key_offset + cell.key().len() as u64;
        let stored_value_offset = if cell.is_tombstone() {
            -(value_offset as i64)
        } else {
            value_offset as i64
        };
        self.index.push((key_offset, stored_value_offset));

        self.writer
            .write_all(cell.key())
            .map_err(|e| StrataError::io(&self.path, e))?;
        if let Some(value) = cell.value() {
            self.writer
                .write_all(value)
                .map_err(|e| StrataError::io(&self.path, e))?;
        }

        self.data_offset = value_offset + cell.value_size();
        Ok(())
    }

    /// Number of rows added so far.
    pub fn rows(&self) -> usize {
        self.index.len()
    }

    /// Write the index region (with its sentinel record) and the footer,
    /// then flush and sync. Returns the final file size in bytes.
    pub fn finish(mut self) -> Result<u64> {
        let index_offset = self.data_offset;
        let index_byte_size = ((self.index.len() + 1) * INDEX_RECORD_SIZE) as u64;

        let index = std::mem::take(&mut self.index);
        for (key_offset, value_offset) in index {
            self.write_u64(key_offset)?;
            self.write_i64(value_offset)?;
        }
        // Sentinel record: gives the implicit length of the last value.
        self.write_u64(index_offset)?;
        self.write_i64(0)?;

        // Footer locates the index region without a separate metadata file.
        self.write_u64(index_offset)?;
        self.write_u64(index_byte_size)?;

        self.writer
            .flush()
            .map_err(|e| StrataError::io(&self.path, e))?;
        let file = self
            .writer
            .into_inner()
            .map_err(|e| StrataError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| StrataError::io(&self.path, e))?;

        let file_size = file
            .metadata()
            .map_err(|e| StrataError::io(&self.path, e))?
            .len();
        Ok(file_size)
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.writer
            .write_all(&v.to_ne_bytes())
            .map_err(|e| StrataError::io(&self.path, e))
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.writer
            .write_all(&v.to_ne_bytes())
            .map_err(|e| StrataError::io(&self.path, e))
    }
}
