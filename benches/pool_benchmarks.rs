use bytes::BufMut;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lightning_pool::raster::rect_tier;
use lightning_pool::{
    tier, BufferPool, BytePool, MmapBytePool, MultiBytePool, MultiRgbaPool, PoolOptions, Rect,
};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

fn benchmark_get_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_put");

    for buf_size in [64usize, 4096, 65536].iter() {
        group.bench_with_input(BenchmarkId::new("byte_pool", buf_size), buf_size, |b, &buf_size| {
            let pool = BytePool::new(64, buf_size, &PoolOptions::default());
            b.iter(|| {
                let mut data = pool.get();
                data[0] = 1;
                black_box(pool.put(data));
            });
        });

        group.bench_with_input(BenchmarkId::new("vec_alloc", buf_size), buf_size, |b, &buf_size| {
            b.iter(|| {
                let mut data = vec![0u8; buf_size];
                data[0] = 1;
                black_box(data);
            });
        });

        group.bench_with_input(BenchmarkId::new("buffer_pool", buf_size), buf_size, |b, &buf_size| {
            let pool = BufferPool::new(64, buf_size, &PoolOptions::default());
            b.iter(|| {
                let mut buf = pool.get();
                buf.put_u64(42);
                black_box(pool.put(buf));
            });
        });

        group.bench_with_input(BenchmarkId::new("mmap_pool", buf_size), buf_size, |b, &buf_size| {
            let pool = MmapBytePool::new(64, buf_size, &PoolOptions::default());
            b.iter(|| {
                let mut buf = pool.get();
                buf[0] = 1;
                black_box(pool.put(buf));
            });
        });
    }

    group.finish();
}

fn benchmark_get_ref(c: &mut Criterion) {
    let pool = BytePool::new(64, 4096, &PoolOptions::default());
    c.bench_function("byte_pool_get_ref", |b| {
        b.iter(|| {
            let mut r = pool.get_ref();
            if let Some(data) = r.get_mut() {
                data[0] = 1;
            }
            black_box(r.release());
        });
    });
}

fn benchmark_router(c: &mut Criterion) {
    let mut group = c.benchmark_group("router");

    let bytes = MultiBytePool::new(
        &[tier(64, 512), tier(64, 4096), tier(64, 16384), tier(64, 65536)],
        &PoolOptions::default(),
    );
    for size in [100usize, 10_000, 60_000].iter() {
        group.bench_with_input(BenchmarkId::new("multi_byte", size), size, |b, &size| {
            b.iter(|| {
                let data = bytes.get(size);
                black_box(bytes.put(data));
            });
        });
    }

    let images = MultiRgbaPool::new(
        &[
            rect_tier(8, Rect::with_size(640, 360)),
            rect_tier(8, Rect::with_size(1280, 720)),
        ],
        &PoolOptions::default(),
    );
    group.bench_function("multi_rgba_600x300", |b| {
        b.iter(|| {
            let r = images.get_ref(Rect::with_size(600, 300));
            black_box(r.is_pooled());
        });
    });

    group.finish();
}

fn benchmark_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    for threads in [2usize, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("byte_pool", threads), threads, |b, &threads| {
            let pool = Arc::new(BytePool::new(64, 4096, &PoolOptions::default()));
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        thread::spawn(move || {
                            for _ in 0..1000 {
                                let data = pool.get();
                                pool.put(data);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_get_put,
    benchmark_get_ref,
    benchmark_router,
    benchmark_contention
);
criterion_main!(benches);
