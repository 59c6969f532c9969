//! Shared memory-mapping arena.
//!
//! One `MapArena` per engine owns every mapping created for its runs. A run
//! holds an `Arc` clone of its mapping, so a mapped view stays valid for as
//! long as any run handle exists; releasing the arena can never invalidate
//! a view that is still reachable. `close` only drops the arena's own
//! references; the underlying mapping is unmapped when the last run drops.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memmap2::Mmap;
use parking_lot::Mutex;

use crate::error::{Result, StrataError};

/// Owner of all memory mappings opened through one engine instance.
pub struct MapArena {
    /// Strong references to every mapping handed out. Cleared on close.
    maps: Mutex<Vec<Arc<Mmap>>>,
    closed: AtomicBool,
}

impl MapArena {
    pub fn new() -> Self {
        Self {
            maps: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Map `file` read-only and register the mapping.
    ///
    /// # Panics
    ///
    /// Panics if the arena is already closed: mapping through a closed
    /// arena is an orchestrator bug, not a recoverable condition.
    ///
    /// # Safety rationale
    ///
    /// Uses `unsafe { Mmap::map(...) }` but is memory-safe under this
    /// engine's ownership rules: run files are never written after
    /// creation, the mapping is read-only, and the engine assumes exclusive
    /// single-process ownership of the data directory.
    pub fn map_file(&self, file: &File, path: &Path) -> Result<Arc<Mmap>> {
        assert!(
            !self.closed.load(Ordering::Acquire),
            "map_file called on a closed arena"
        );
        let map = unsafe { Mmap::map(file) }.map_err(|e| StrataError::io(path, e))?;
        let map = Arc::new(map);
        self.maps.lock().push(Arc::clone(&map));
        Ok(map)
    }

    /// Drop the arena's references to every mapping. Idempotent; must be
    /// ordered after all runs are closed for the mappings to actually be
    /// released.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.maps.lock().clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for MapArena {
    fn default() -> Self {
        Self::new()
    }
}
