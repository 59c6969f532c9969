//! Run Module
//!
//! A run is an immutable, sorted, memory-mapped on-disk snapshot of one
//! memtable flush.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Data Region (variable)                                      │
//! │   key1 value1 key2 value2 ...                               │
//! │   raw bytes in ascending key order, no delimiters;          │
//! │   addressed purely by offset from the index                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Index Region ((rows + 1) × 16 bytes)                        │
//! │   record i: KeyOffset: u64 (8) | ValueOffset: i64 (8)       │
//! │   ValueOffset is negated when row i is a tombstone          │
//! │   (its absolute value is still the byte offset)             │
//! │   record rows: EndOfData: u64 (8) | 0 (8)     (sentinel)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                           │
//! │   IndexOffset: u64 (8) | IndexByteSize: u64 (8)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are fixed-width 8-byte, platform-native byte order;
//! writer and reader must match exactly. Keys strictly increase across
//! rows; a run is the product of exactly one memtable flush, which already
//! de-duplicates.

mod arena;
mod pool;
mod reader;
mod writer;

use std::path::{Path, PathBuf};

pub use arena::MapArena;
pub use pool::RunPool;
pub use reader::Run;
pub use writer::RunWriter;

// =============================================================================
// Shared Constants (used by writer, reader, pool)
// =============================================================================

/// Size of one stored integer.
pub(crate) const OFFSET_SIZE: usize = 8;

/// One index record: key offset + value offset.
pub(crate) const INDEX_RECORD_SIZE: usize = 2 * OFFSET_SIZE;

/// Trailing footer: index offset + index byte size.
pub(crate) const FOOTER_SIZE: usize = 2 * OFFSET_SIZE;

// =============================================================================
// Run File Naming
// =============================================================================

/// Generate the file path for a run with the given number.
pub(crate) fn run_path(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("run_{:06}.run", number))
}

/// Parse a run number from a filename.
/// "run_000042.run" → Some(42)
pub(crate) fn parse_run_number(path: &Path) -> Option<u64> {
    if path.extension()? != "run" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("run_")?.parse().ok()
}
