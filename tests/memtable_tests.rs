//! Tests for the MemTable
//!
//! These tests verify:
//! - Upsert/replace semantics, including tombstone overwrite
//! - "Absent" vs "present as tombstone" distinction
//! - Ceiling key and bounded range iteration
//! - Byte-size tracking and clear
//! - Concurrent upserts from multiple threads

use std::sync::Arc;
use std::thread;

use stratakv::memtable::MemTable;
use stratakv::{Cell, Entry};

// =============================================================================
// Helper Functions
// =============================================================================

fn put(table: &MemTable, key: &[u8], value: &[u8]) {
    table.upsert(Cell::from(Entry::put(key.to_vec(), value.to_vec())));
}

fn delete(table: &MemTable, key: &[u8]) {
    table.upsert(Cell::from(Entry::tombstone(key.to_vec())));
}

fn range_keys(table: &MemTable, from: Option<&[u8]>, to: Option<&[u8]>) -> Vec<Vec<u8>> {
    table.range(from, to).map(|c| c.key().to_vec()).collect()
}

// =============================================================================
// Upsert / Lookup Tests
// =============================================================================

#[test]
fn test_upsert_and_get_cell() {
    let table = MemTable::new();
    put(&table, b"key1", b"value1");

    let cell = table.get_cell(b"key1").unwrap();
    assert!(!cell.is_tombstone());
    assert_eq!(cell.value().unwrap().as_ref(), b"value1");
}

#[test]
fn test_get_absent_key() {
    let table = MemTable::new();
    assert!(table.get_cell(b"missing").is_none());
}

#[test]
fn test_upsert_replaces_prior_cell() {
    let table = MemTable::new();
    put(&table, b"key", b"old");
    put(&table, b"key", b"new");

    assert_eq!(table.len(), 1);
    assert_eq!(
        table.get_cell(b"key").unwrap().value().unwrap().as_ref(),
        b"new"
    );
}

#[test]
fn test_tombstone_is_present_not_absent() {
    let table = MemTable::new();
    put(&table, b"key", b"value");
    delete(&table, b"key");

    // A tombstone is a present cell, distinct from "not in this memtable".
    let cell = table.get_cell(b"key").unwrap();
    assert!(cell.is_tombstone());
    assert_eq!(cell.value(), None);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_write_after_delete_undeletes() {
    let table = MemTable::new();
    delete(&table, b"key");
    put(&table, b"key", b"back");

    let cell = table.get_cell(b"key").unwrap();
    assert!(!cell.is_tombstone());
    assert_eq!(cell.value().unwrap().as_ref(), b"back");
}

// =============================================================================
// Ceiling Key Tests
// =============================================================================

#[test]
fn test_ceiling_key() {
    let table = MemTable::new();
    put(&table, b"b", b"1");
    put(&table, b"d", b"2");

    assert_eq!(table.ceiling_key(b"a").unwrap().as_ref(), b"b");
    assert_eq!(table.ceiling_key(b"b").unwrap().as_ref(), b"b");
    assert_eq!(table.ceiling_key(b"c").unwrap().as_ref(), b"d");
    assert!(table.ceiling_key(b"e").is_none());
}

// =============================================================================
// Range Iteration Tests
// =============================================================================

#[test]
fn test_range_is_sorted_and_bounded() {
    let table = MemTable::new();
    for key in [&b"c"[..], b"a", b"e", b"b", b"d"] {
        put(&table, key, b"v");
    }

    // from inclusive, to exclusive
    assert_eq!(
        range_keys(&table, Some(b"b"), Some(b"d")),
        vec![b"b".to_vec(), b"c".to_vec()]
    );
}

#[test]
fn test_range_unbounded() {
    let table = MemTable::new();
    put(&table, b"b", b"1");
    put(&table, b"a", b"2");

    assert_eq!(
        range_keys(&table, None, None),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
    assert_eq!(range_keys(&table, Some(b"b"), None), vec![b"b".to_vec()]);
    assert_eq!(range_keys(&table, None, Some(b"b")), vec![b"a".to_vec()]);
}

#[test]
fn test_range_empty_when_from_equals_to() {
    let table = MemTable::new();
    put(&table, b"a", b"1");
    assert!(range_keys(&table, Some(b"a"), Some(b"a")).is_empty());
}

#[test]
fn test_range_includes_tombstones() {
    let table = MemTable::new();
    put(&table, b"a", b"1");
    delete(&table, b"b");

    // The memtable itself exposes tombstones; the merge layer filters them.
    let cells: Vec<_> = table.range(None, None).collect();
    assert_eq!(cells.len(), 2);
    assert!(!cells[0].is_tombstone());
    assert!(cells[1].is_tombstone());
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_byte_size_counts_key_and_value() {
    let table = MemTable::new();
    assert_eq!(table.byte_size(), 0);

    put(&table, b"abc", b"12345"); // 3 + 5
    assert_eq!(table.byte_size(), 8);

    delete(&table, b"xy"); // tombstone contributes key bytes only
    assert_eq!(table.byte_size(), 10);
}

#[test]
fn test_byte_size_is_monotonic_between_clears() {
    let table = MemTable::new();
    put(&table, b"abc", b"12345"); // 8
    put(&table, b"abc", b"12"); // overwrite still adds 3 + 2

    assert_eq!(table.byte_size(), 13);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_clear_resets_everything() {
    let table = MemTable::new();
    put(&table, b"k1", b"v1");
    put(&table, b"k2", b"v2");

    table.clear();

    assert!(table.is_empty());
    assert_eq!(table.byte_size(), 0);
    assert!(table.get_cell(b"k1").is_none());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_upserts_to_distinct_keys() {
    let table = Arc::new(MemTable::new());

    let mut handles = vec![];
    for t in 0..4 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                let key = format!("thread{}_key{:03}", t, i);
                let value = format!("value{}", i);
                table.upsert(Cell::from(Entry::put(key.into_bytes(), value.into_bytes())));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // No upsert lost
    assert_eq!(table.len(), 1000);
    for t in 0..4 {
        for i in 0..250 {
            let key = format!("thread{}_key{:03}", t, i);
            assert!(table.get_cell(key.as_bytes()).is_some(), "lost {}", key);
        }
    }
}

#[test]
fn test_concurrent_upserts_to_same_key_last_write_wins() {
    let table = Arc::new(MemTable::new());

    let mut handles = vec![];
    for t in 0..4u8 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                table.upsert(Cell::from(Entry::put(&b"contended"[..], vec![t])));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // One of the writers won; which one is undefined.
    let cell = table.get_cell(b"contended").unwrap();
    assert_eq!(table.len(), 1);
    assert!(cell.value().unwrap()[0] < 4);
}
