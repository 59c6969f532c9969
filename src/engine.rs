//! Engine Module
//!
//! The orchestrator that ties the storage layers together.
//!
//! ## Responsibilities
//! - Route writes to the live memtable
//! - Route point reads memtable-first, then runs newest → oldest
//! - Assemble merged range reads across every source
//! - Flush the memtable into a new run and publish it
//! - Tear down runs and the mapping arena in order on close

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::entry::{Cell, Entry, Value};
use crate::error::{Result, StrataError};
use crate::iter::{MergeCursor, MergeIterator};
use crate::memtable::{MemTable, MEMTABLE_RECENCY};
use crate::run::{MapArena, RunPool};

/// The main storage engine.
///
/// ## Concurrency Model
///
/// - **Reads** (get/range): lock-free. The memtable is a concurrent
///   skiplist and runs are immutable once published.
/// - **Writes** (upsert): lock-free against each other; they hold the
///   flush gate in *shared* mode so a concurrent flush cannot drop them.
/// - **Flush** (flush/close): holds the flush gate *exclusively* around
///   snapshot-and-clear, so every upsert lands either in the pre-flush
///   snapshot or in the fresh memtable, never in between.
///
/// Within one thread, a read issued after an upsert on the same key
/// observes that upsert. No other cross-thread linearizability is
/// promised.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory holding the run files (derived from data_dir)
    runs_dir: PathBuf,

    /// Live memtable; created once, cleared after each flush
    memtable: MemTable,

    /// On-disk run set
    runs: RunPool,

    /// Shared mapping arena; outlives every mapped view, closed last
    arena: Arc<MapArena>,

    /// Shared for upsert, exclusive for snapshot-and-clear
    flush_gate: RwLock<()>,

    /// Latch making close idempotent
    closed: AtomicBool,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const RUNS_DIR: &'static str = "runs";

    /// Open or create an engine rooted at the configured data directory.
    ///
    /// Run files are discovered lazily on first read or flush, in
    /// ascending file-number order; file number order is recency order,
    /// because runs are only ever appended.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir).map_err(|e| StrataError::io(&config.data_dir, e))?;

        let runs_dir = config.data_dir.join(Self::RUNS_DIR);
        let arena = Arc::new(MapArena::new());
        let runs = RunPool::open(&runs_dir, Arc::clone(&arena))?;

        tracing::info!(data_dir = %config.data_dir.display(), "engine opened");

        Ok(Self {
            config,
            runs_dir,
            memtable: MemTable::new(),
            runs,
            arena,
            flush_gate: RwLock::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Open with a path (convenience method).
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Insert an entry (a value or a tombstone) into the live memtable.
    pub fn upsert(&self, entry: Entry) -> Result<()> {
        let _gate = self.flush_gate.read();
        self.memtable.upsert(Cell::from(entry));
        Ok(())
    }

    /// Get the live value for a key.
    ///
    /// Search order: memtable first (freshest), then runs newest → oldest,
    /// stopping at the first source that knows the key. A tombstone hit
    /// resolves to "not found" immediately: it shadows the key in every
    /// older run, so the search must not continue past it.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        if let Some(cell) = self.memtable.get_cell(key) {
            return Ok(cell.into_value());
        }
        match self.runs.get(key)? {
            Some(cell) => Ok(cell.into_value()),
            None => Ok(None),
        }
    }

    /// Merged ascending iterator over the live cells in `[from, to)`;
    /// `None` bounds are unbounded. Tombstoned keys are absent and every
    /// emitted value is the most recent one.
    pub fn range<'a>(
        &'a self,
        from: Option<&'a [u8]>,
        to: Option<&'a [u8]>,
    ) -> Result<MergeIterator<'a>> {
        let mut cursors: Vec<MergeCursor<'a>> = self.runs.range_cursors(from, to)?;
        cursors.push(MergeCursor::new(
            MEMTABLE_RECENCY,
            Box::new(self.memtable.range(from, to)),
        ));
        Ok(MergeIterator::new(cursors))
    }

    /// Flush the memtable into a new run.
    ///
    /// No-op on an empty memtable. On success the run is published with
    /// the next recency number and the memtable is cleared; on failure the
    /// engine is left exactly in its pre-flush state, so flush is safely
    /// retryable.
    pub fn flush(&self) -> Result<()> {
        let _gate = self.flush_gate.write();
        self.flush_locked()
    }

    /// Snapshot-and-clear; caller holds the flush gate exclusively.
    fn flush_locked(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        self.runs.write_run(&self.memtable)?;
        self.memtable.clear();
        Ok(())
    }

    /// Close the engine: flush any remaining memtable data, close every
    /// run, then release the mapping arena. Idempotent: a second call is
    /// a no-op and nothing is double-released.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let flushed = {
            let _gate = self.flush_gate.write();
            self.flush_locked()
        };

        // Runs drop their mapped views before the arena lets go of them.
        self.runs.close();
        self.arena.close();

        tracing::info!(data_dir = %self.config.data_dir.display(), "engine closed");
        flushed
    }

    // =========================================================================
    // Accessors (for embedding callers, tests and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the directory where run files are stored
    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    /// Cumulative memtable byte size; compare against
    /// `Config::memtable_size_limit` to decide when to flush
    pub fn memtable_size(&self) -> u64 {
        self.memtable.byte_size()
    }

    /// Number of distinct keys in the memtable
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }

    /// Number of on-disk runs currently open
    pub fn run_count(&self) -> usize {
        self.runs.run_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "close on drop failed");
            }
        }
    }
}
