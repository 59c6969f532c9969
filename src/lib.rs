//! # StrataKV
//!
//! An embeddable, single-node key-value storage engine built on the
//! log-structured-merge pattern:
//! - Concurrent in-memory sorted buffer (memtable) absorbing all writes
//! - Immutable, sorted, memory-mapped on-disk runs produced by flush
//! - K-way merge reads with recency-based conflict resolution
//! - Explicit tombstones shadowing older versions of a key
//!
//! ## Architecture Overview
//!
//! ```text
//!                    upsert / get / range / flush
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────┐
//! │                           Engine                            │
//! │              (flush gate, read routing, close)              │
//! └───────┬──────────────────────┬──────────────────────┬───────┘
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//!  ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//!  │  MemTable   │ flush  │   RunPool   │        │  MapArena   │
//!  │  (SkipMap)  │ ─────► │ run_000001  │ ─maps─►│ (Arc<Mmap>) │
//!  └─────────────┘        │ run_000002  │        └─────────────┘
//!                         │     ...     │
//!                         └─────────────┘
//! ```
//!
//! Reads consult the memtable first, then runs from newest to oldest; a
//! tombstone in a newer source shadows the key in every older one. Range
//! reads merge all sources through a priority-ordered [`MergeIterator`]
//! that emits at most one live cell per key, in ascending key order.
//!
//! ## Example
//! ```no_run
//! use stratakv::{Config, Engine, Entry};
//!
//! let config = Config::builder().data_dir("./stratakv_data").build();
//! let engine = Engine::open(config).unwrap();
//!
//! engine.upsert(Entry::put(&b"key"[..], &b"value"[..])).unwrap();
//! assert_eq!(engine.get(b"key").unwrap().as_deref(), Some(&b"value"[..]));
//!
//! engine.upsert(Entry::tombstone(&b"key"[..])).unwrap();
//! assert_eq!(engine.get(b"key").unwrap(), None);
//!
//! engine.close().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod compare;
pub mod entry;
pub mod memtable;
pub mod run;
pub mod iter;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StrataError};
pub use config::Config;
pub use entry::{Cell, Entry, Key, Value};
pub use engine::Engine;
pub use iter::MergeIterator;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
