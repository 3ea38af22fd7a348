use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flexpool::{Config, PoolInner};
use std::hint::black_box;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::time::Duration;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
}

// Benchmark 1: submit-and-drain throughput vs bare tokio::spawn
fn bench_submit_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_throughput");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("pool", size), &size, |b, &size| {
            let rt = create_runtime();
            let pool = rt.block_on(async {
                PoolInner::with_config(Config {
                    max_workers: num_cpus::get(),
                    max_queue_depth: size * 2,
                    idle_timeout: Duration::from_secs(10),
                })
            });

            b.to_async(&rt).iter(|| {
                let pool = &pool;
                async move {
                    let done = Arc::new(AtomicUsize::new(0));
                    for i in 0..size {
                        let done = done.clone();
                        pool.submit(move || {
                            black_box(i);
                            done.fetch_add(1, Ordering::Relaxed);
                        })
                        .await
                        .unwrap();
                    }
                    while done.load(Ordering::Relaxed) < size {
                        tokio::task::yield_now().await;
                    }
                }
            });
        });

        // tokio baseline
        group.bench_with_input(BenchmarkId::new("tokio_spawn", size), &size, |b, &size| {
            let rt = create_runtime();

            b.to_async(&rt).iter(|| async move {
                let handles: Vec<_> = (0..size)
                    .map(|i| tokio::spawn(async move { black_box(i) }))
                    .collect();
                for handle in handles {
                    black_box(handle.await.unwrap());
                }
            });
        });
    }

    group.finish();
}

// Benchmark 2: worker cap scaling
fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");
    group.sample_size(20);

    let tasks = 5000usize;
    group.throughput(Throughput::Elements(tasks as u64));

    for workers in [2, 4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::new("max_workers", workers),
            &workers,
            |b, &workers| {
                let rt = create_runtime();
                let pool = rt.block_on(async {
                    PoolInner::with_config(Config {
                        max_workers: workers,
                        max_queue_depth: tasks * 2,
                        idle_timeout: Duration::from_secs(10),
                    })
                });

                b.to_async(&rt).iter(|| {
                    let pool = &pool;
                    async move {
                        let done = Arc::new(AtomicUsize::new(0));
                        for i in 0..tasks {
                            let done = done.clone();
                            pool.submit(move || {
                                black_box(i.wrapping_mul(31));
                                done.fetch_add(1, Ordering::Relaxed);
                            })
                            .await
                            .unwrap();
                        }
                        while done.load(Ordering::Relaxed) < tasks {
                            tokio::task::yield_now().await;
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_submit_throughput, bench_worker_scaling);
criterion_main!(benches);
