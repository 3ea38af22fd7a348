use flexpool::{Config, PoolInner};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::runtime::Builder;
use tokio::time::{sleep, Duration};

fn main() {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    rt.block_on(async {
        const TASKS: usize = 100_000;

        let now = Instant::now();
        let pool = PoolInner::with_config(Config::per_core());
        let done = Arc::new(AtomicUsize::new(0));

        let mut rejected = 0usize;
        for _ in 0..TASKS {
            let done = done.clone();
            if pool
                .submit(move || {
                    done.fetch_add(1, Ordering::Relaxed);
                })
                .await
                .is_err()
            {
                rejected += 1;
            }
        }

        while done.load(Ordering::Relaxed) + rejected < TASKS {
            sleep(Duration::from_millis(5)).await;
        }

        let metrics = pool.metrics();
        println!(
            "ran {} tasks ({} rejected) in {:?}",
            done.load(Ordering::Relaxed),
            rejected,
            now.elapsed()
        );
        println!(
            "alive workers: {}, utilization: {:.1}%",
            metrics.alive_workers,
            metrics.utilization() * 100.0
        );

        pool.close();
    });
}
