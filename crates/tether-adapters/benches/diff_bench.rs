//! Benchmarks for the keyed list diff.
//!
//! Run with: cargo bench -p tether-adapters --bench diff_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tether_adapters::diff;

/// Deterministic edit of `0..len`: drop every `stride`-th key, append fresh
/// keys and rotate a block to the front.
fn make_pair(len: u32, stride: u32) -> (Vec<u32>, Vec<u32>) {
    let old: Vec<u32> = (0..len).collect();
    let mut new: Vec<u32> = old.iter().copied().filter(|k| k % stride != 0).collect();
    new.extend(len..len + len / stride);
    let block = new.len() / 10;
    new.rotate_right(block);
    (old, new)
}

fn bench_identical(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/identical");
    for len in [100u32, 1_000, 10_000] {
        group.throughput(Throughput::Elements(u64::from(len)));
        let items: Vec<u32> = (0..len).collect();
        group.bench_with_input(BenchmarkId::new("compute", len), &(), |b, _| {
            b.iter(|| black_box(diff(&items, &items)))
        });
    }
    group.finish();
}

fn bench_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/sparse_edit");
    for len in [100u32, 1_000, 10_000] {
        group.throughput(Throughput::Elements(u64::from(len)));
        let (old, new) = make_pair(len, 20);
        group.bench_with_input(BenchmarkId::new("compute", len), &(), |b, _| {
            b.iter(|| black_box(diff(&old, &new)))
        });
    }
    group.finish();
}

fn bench_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/heavy_edit");
    for len in [100u32, 1_000] {
        group.throughput(Throughput::Elements(u64::from(len)));
        let (old, new) = make_pair(len, 2);
        group.bench_with_input(BenchmarkId::new("compute", len), &(), |b, _| {
            b.iter(|| black_box(diff(&old, &new)))
        });
    }
    group.finish();
}

fn bench_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff/reverse");
    for len in [100u32, 1_000] {
        group.throughput(Throughput::Elements(u64::from(len)));
        let old: Vec<u32> = (0..len).collect();
        let new: Vec<u32> = old.iter().rev().copied().collect();
        group.bench_with_input(BenchmarkId::new("compute", len), &(), |b, _| {
            b.iter(|| black_box(diff(&old, &new)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_identical, bench_sparse, bench_heavy, bench_reverse);
criterion_main!(benches);
