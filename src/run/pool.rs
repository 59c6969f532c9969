//! Run pool
//!
//! Owns the set of on-disk runs for one data directory.
//!
//! ## Responsibilities
//! - Lazily discover existing run files and open them in file-number order
//! - Assign recency numbers at flush time (file order == flush order; the
//!   set only ever grows by appending newer runs)
//! - Search runs newest → oldest for point reads
//! - Publish a newly flushed run atomically
//!
//! ## Concurrency
//! - `runs`: RwLock'd vec, ascending recency; readers see either the old
//!   set or the new set, never a partially built one
//! - `next_number`: atomic counter, seeded from the highest discovered file
//! - `discovery_lock`: serializes the one-time lazy directory scan

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::entry::Cell;
use crate::error::{Result, StrataError};
use crate::iter::MergeCursor;
use crate::memtable::MemTable;

use super::{parse_run_number, run_path, MapArena, Run, RunWriter};

/// Manages the run set for one engine instance.
pub struct RunPool {
    /// Directory holding the run files.
    dir: PathBuf,

    /// Shared mapping arena every opened run borrows from.
    arena: Arc<MapArena>,

    /// Open runs in ascending recency order (oldest first).
    runs: RwLock<Vec<Arc<Run>>>,

    /// Recency number for the next flushed run.
    next_number: AtomicU64,

    /// Set once the lazy directory scan has run.
    discovered: AtomicBool,
    discovery_lock: Mutex<()>,
}

impl RunPool {
    /// Create the pool for `dir`, creating the directory if needed. Run
    /// files are not opened here; discovery happens on first access.
    pub fn open(dir: &Path, arena: Arc<MapArena>) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| StrataError::io(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            arena,
            runs: RwLock::new(Vec::new()),
            next_number: AtomicU64::new(1),
            discovered: AtomicBool::new(false),
            discovery_lock: Mutex::new(()),
        })
    }

    /// Open any on-disk run files not yet opened, in ascending file-number
    /// order, and seed the recency counter past the highest number seen.
    fn ensure_discovered(&self) -> Result<()> {
        if self.discovered.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.discovery_lock.lock();
        if self.discovered.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut numbers = Vec::new();
        for dir_entry in fs::read_dir(&self.dir).map_err(|e| StrataError::io(&self.dir, e))? {
            let dir_entry = dir_entry.map_err(|e| StrataError::io(&self.dir, e))?;
            let path = dir_entry.path();
            if path.is_file() {
                if let Some(number) = parse_run_number(&path) {
                    numbers.push(number);
                }
            }
        }
        numbers.sort_unstable();

        let mut opened = Vec::with_capacity(numbers.len());
        for &number in &numbers {
            let path = run_path(&self.dir, number);
            opened.push(Arc::new(Run::open(&path, number, &self.arena)?));
        }
        if let Some(&highest) = numbers.last() {
            self.next_number.store(highest + 1, Ordering::Release);
        }

        tracing::debug!(dir = %self.dir.display(), count = opened.len(), "discovered runs");
        *self.runs.write() = opened;
        self.discovered.store(true, Ordering::Release);
        Ok(())
    }

    /// Point lookup across runs, newest → oldest.
    ///
    /// Returns the first cell found, tombstone included, because a
    /// tombstone in a newer run shadows the key in all older runs and the
    /// search must not continue past it. The engine collapses tombstones
    /// into "not found".
    pub fn get(&self, key: &[u8]) -> Result<Option<Cell>> {
        self.ensure_discovered()?;
        let runs = self.runs.read();
        for run in runs.iter().rev() {
            if let Some(cell) = run.get_cell(key) {
                return Ok(Some(cell));
            }
        }
        Ok(None)
    }

    /// One recency-tagged cursor per run, each restricted to `[from, to)`.
    pub fn range_cursors(
        &self,
        from: Option<&[u8]>,
        to: Option<&[u8]>,
    ) -> Result<Vec<MergeCursor<'static>>> {
        self.ensure_discovered()?;
        let runs = self.runs.read();
        Ok(runs
            .iter()
            .map(|run| Arc::clone(run).range_cursor(from, to))
            .collect())
    }

    /// Flush a memtable snapshot into a new run and publish it.
    ///
    /// On any failure the half-written file is removed best-effort and
    /// nothing is registered: the run set and the memtable are exactly as
    /// before, so the caller can retry.
    pub fn write_run(&self, memtable: &MemTable) -> Result<u64> {
        self.ensure_discovered()?;
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        let path = run_path(&self.dir, number);

        match self.build_run(&path, memtable, number) {
            Ok(run) => {
                let rows = run.rows();
                self.runs.write().push(run);
                tracing::info!(path = %path.display(), number, rows, "flushed run");
                Ok(number)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "flush aborted");
                if let Err(rm) = fs::remove_file(&path) {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %path.display(), error = %rm, "could not remove partial run file");
                    }
                }
                Err(e)
            }
        }
    }

    fn build_run(&self, path: &Path, memtable: &MemTable, number: u64) -> Result<Arc<Run>> {
        let mut writer = RunWriter::new(path)?;
        for cell in memtable.range(None, None) {
            writer.add(&cell)?;
        }
        writer.finish()?;
        Ok(Arc::new(Run::open(path, number, &self.arena)?))
    }

    /// Number of runs currently open.
    pub fn run_count(&self) -> usize {
        self.runs.read().len()
    }

    /// Directory holding the run files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Drop every open run. Idempotent; ordered before the arena closes.
    pub fn close(&self) {
        self.runs.write().clear();
    }
}
