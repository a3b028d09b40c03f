use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use std::sync::Arc;
use rookdb::storage::buffer::{BufferPool, BufferPoolInstance, ParallelBufferPool};
use rookdb::storage::disk::DiskManager;

// Create a buffer pool instance backed by a temporary database
fn create_bench_buffer_pool(pool_size: usize) -> Arc<BufferPoolInstance> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();
    let disk_manager = Arc::new(DiskManager::new(path).unwrap());

    // Keep the temp file alive
    std::mem::forget(temp_file);

    Arc::new(BufferPoolInstance::new(pool_size, disk_manager))
}

fn create_bench_parallel_pool(num_instances: usize, pool_size: usize) -> Arc<ParallelBufferPool> {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();
    let disk_manager = Arc::new(DiskManager::new(path).unwrap());

    std::mem::forget(temp_file);

    Arc::new(ParallelBufferPool::new(num_instances, pool_size, disk_manager))
}

fn buffer_pool_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("BufferPool");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("sequential_fetch", size), size, |b, &size| {
            let buffer_pool = create_bench_buffer_pool(size);

            let mut page_ids = Vec::new();
            for _ in 0..size {
                let (_, page_id) = buffer_pool.new_page().unwrap();
                buffer_pool.unpin_page(page_id, false).unwrap();
                page_ids.push(page_id);
            }

            b.iter(|| {
                for &page_id in &page_ids {
                    buffer_pool.fetch_page(page_id).unwrap();
                    buffer_pool.unpin_page(page_id, false).unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("random_fetch", size), size, |b, &size| {
            let buffer_pool = create_bench_buffer_pool(size);

            // Twice as many pages as frames so fetches hit the replacer
            let mut page_ids = Vec::new();
            for _ in 0..size * 2 {
                let (_, page_id) = buffer_pool.new_page().unwrap();
                buffer_pool.unpin_page(page_id, false).unwrap();
                page_ids.push(page_id);
            }

            let mut rng = StdRng::seed_from_u64(42);

            b.iter(|| {
                let page_id = *page_ids.choose(&mut rng).unwrap();
                buffer_pool.fetch_page(page_id).unwrap();
                buffer_pool.unpin_page(page_id, false).unwrap();
            });
        });
    }

    group.finish();
}

fn parallel_pool_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParallelBufferPool");

    for num_instances in [1, 4].iter() {
        group.bench_with_input(
            BenchmarkId::new("new_and_unpin", num_instances),
            num_instances,
            |b, &num_instances| {
                let buffer_pool = create_bench_parallel_pool(num_instances, 100);

                b.iter(|| {
                    let (_, page_id) = buffer_pool.new_page().unwrap();
                    buffer_pool.unpin_page(page_id, false).unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, buffer_pool_benchmark, parallel_pool_benchmark);
criterion_main!(benches);
