//! Benchmarks for StrataKV storage operations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratakv::{Config, Engine, Entry};
use tempfile::TempDir;

fn bench_engine(data_dir: &std::path::Path) -> Engine {
    let config = Config::builder().data_dir(data_dir).build();
    Engine::open(config).unwrap()
}

/// Single-key write throughput into the memtable.
fn upsert_throughput(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let engine = bench_engine(temp_dir.path());

    let mut i = 0u64;
    c.bench_function("upsert_memtable", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            let key = format!("key{:08}", i % 100_000);
            engine
                .upsert(Entry::put(key.into_bytes(), &b"value-payload-64-bytes"[..]))
                .unwrap();
        })
    });
}

/// Point reads served from the memtable.
fn get_from_memtable(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let engine = bench_engine(temp_dir.path());

    for i in 0..10_000u64 {
        let key = format!("key{:08}", i);
        engine
            .upsert(Entry::put(key.into_bytes(), &b"value"[..]))
            .unwrap();
    }

    let mut i = 0u64;
    c.bench_function("get_memtable", |b| {
        b.iter(|| {
            i = i.wrapping_add(7);
            let key = format!("key{:08}", i % 10_000);
            black_box(engine.get(key.as_bytes()).unwrap());
        })
    });
}

/// Point reads binary-searching a flushed, memory-mapped run.
fn get_from_run(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let engine = bench_engine(temp_dir.path());

    for i in 0..10_000u64 {
        let key = format!("key{:08}", i);
        engine
            .upsert(Entry::put(key.into_bytes(), &b"value"[..]))
            .unwrap();
    }
    engine.flush().unwrap();

    let mut i = 0u64;
    c.bench_function("get_run", |b| {
        b.iter(|| {
            i = i.wrapping_add(7);
            let key = format!("key{:08}", i % 10_000);
            black_box(engine.get(key.as_bytes()).unwrap());
        })
    });
}

/// Full merged range scan across memtable and runs.
fn range_scan(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let engine = bench_engine(temp_dir.path());

    for i in 0..5_000u64 {
        let key = format!("key{:08}", i);
        engine
            .upsert(Entry::put(key.into_bytes(), &b"value"[..]))
            .unwrap();
    }
    engine.flush().unwrap();
    for i in 2_500..7_500u64 {
        let key = format!("key{:08}", i);
        engine
            .upsert(Entry::put(key.into_bytes(), &b"newer"[..]))
            .unwrap();
    }

    c.bench_function("range_scan_merged", |b| {
        b.iter(|| {
            let count = engine.range(None, None).unwrap().count();
            black_box(count);
        })
    });
}

criterion_group!(
    benches,
    upsert_throughput,
    get_from_memtable,
    get_from_run,
    range_scan
);
criterion_main!(benches);
