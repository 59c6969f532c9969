//! Core data model: entries and cells.
//!
//! An [`Entry`] is the caller-facing pair of a key and an optional value;
//! an absent value marks a tombstone (logical deletion). A [`Cell`] wraps an
//! entry with the derived facts the storage layers care about. Cells are the
//! unit stored in the memtable and read back from runs.

use bytes::Bytes;

/// Key type for the storage engine: arbitrary binary, never absent.
pub type Key = Bytes;

/// Value type for the storage engine: arbitrary binary.
pub type Value = Bytes;

/// An immutable key/value pair. `value = None` denotes a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Key,
    value: Option<Value>,
}

impl Entry {
    /// Create an entry with a value (upsert of live data).
    pub fn put(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Create a tombstone entry (logical deletion of `key`).
    pub fn tombstone(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// An [`Entry`] plus derived facts; the unit stored in the memtable and
/// persisted to runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell(Entry);

impl Cell {
    pub fn key(&self) -> &Key {
        self.0.key()
    }

    pub fn value(&self) -> Option<&Value> {
        self.0.value()
    }

    /// Byte length of the value; 0 for a tombstone.
    pub fn value_size(&self) -> u64 {
        self.0.value.as_ref().map_or(0, |v| v.len() as u64)
    }

    pub fn is_tombstone(&self) -> bool {
        self.0.value.is_none()
    }

    pub fn into_entry(self) -> Entry {
        self.0
    }

    pub fn into_value(self) -> Option<Value> {
        self.0.value
    }
}

impl From<Entry> for Cell {
    fn from(entry: Entry) -> Self {
        Self(entry)
    }
}
