//! Benchmarks for batcher throughput
//!
//! This benchmark measures:
//! - Single-producer add + drain throughput across batch sizes
//! - Multi-producer contention with a small queue

use batchpipe::Batcher;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const ELEMENTS: u64 = 100_000;

fn summing_batcher(batch_size: usize, queue_size: usize) -> (Batcher<u64>, Arc<AtomicU64>) {
    let total = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&total);
    let batcher = Batcher::create()
        .with_name("bench")
        .with_batch_size(batch_size)
        .with_queue_size(queue_size)
        .with_consumer(move |batch| {
            sink.fetch_add(batch.iter().copied().map(black_box).sum(), Ordering::Relaxed);
        });
    (batcher, total)
}

fn bench_single_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_producer");
    group.throughput(Throughput::Elements(ELEMENTS));

    for batch_size in [64usize, 1024, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    let (batcher, total) = summing_batcher(batch_size, 8);
                    batcher.start(2).unwrap();
                    let mut adder = batcher.adder();
                    for i in 0..ELEMENTS {
                        adder.add(i).unwrap();
                    }
                    batcher.stop();
                    black_box(total.load(Ordering::Relaxed))
                })
            },
        );
    }
    group.finish();
}

fn bench_multi_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_producer");
    group.throughput(Throughput::Elements(ELEMENTS));
    group.sample_size(20);

    for producers in [2u64, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(producers),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let (batcher, total) = summing_batcher(1024, 2);
                    batcher.start(4).unwrap();
                    let handles: Vec<_> = (0..producers)
                        .map(|p| {
                            let batcher = batcher.clone();
                            thread::spawn(move || {
                                let mut adder = batcher.adder();
                                let mut i = p;
                                while i < ELEMENTS {
                                    adder.add(i).unwrap();
                                    i += producers;
                                }
                            })
                        })
                        .collect();
                    for h in handles {
                        h.join().unwrap();
                    }
                    batcher.stop();
                    black_box(total.load(Ordering::Relaxed))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_producer, bench_multi_producer);
criterion_main!(benches);
