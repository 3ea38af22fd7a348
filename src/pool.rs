use super::{
    errors::SubmitError,
    model::PoolMetrics,
    task::{Job, Task},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, LazyLock,
};
use crossbeam::queue::ArrayQueue;
use tokio::{
    sync::{mpsc, Notify},
    time::{self, Duration},
};
use tokio_util::sync::CancellationToken;

/// Pool sizing and timing knobs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hard cap on simultaneously alive workers.
    pub max_workers: usize,
    /// Capacity of the submission queue.
    pub max_queue_depth: usize,
    /// How long an idle worker waits before signalling the pool to shrink.
    /// Doubles as the submission wait window on a full queue.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 100,
            max_queue_depth: 10_000,
            idle_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Sizing derived from the host core count, for CPU-shaped callbacks.
    pub fn per_core() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            max_workers: num_cpus * 2,
            max_queue_depth: num_cpus * 100,
            ..Default::default()
        }
    }
}

pub type Pool = Arc<PoolInner>;

/// External face of one worker: its depth-1 task mailbox and the token that
/// terminates its loop. Handles are fungible; any idle handle serves any
/// task, and the release path cancels whichever handle it happens to pop.
#[derive(Clone)]
struct WorkerHandle {
    slot: mpsc::Sender<Task>,
    stop: CancellationToken,
}

/// Bounded set of idle worker handles.
///
/// Push and pop are non-blocking; `take_or_shutdown` is the dispatcher's
/// blocking receive, racing the shutdown signal. A handle lives in exactly
/// one place at a time, so whoever pops it owns it.
struct IdleRegistry {
    slots: ArrayQueue<WorkerHandle>,
    ready: Notify,
}

impl IdleRegistry {
    fn new(capacity: usize) -> Self {
        Self {
            slots: ArrayQueue::new(capacity),
            ready: Notify::new(),
        }
    }

    /// Registers a handle for reuse. Returns false if the registry is full,
    /// in which case the handle is dropped and the worker stays alive but
    /// undiscoverable until a timer releases some other slot.
    fn put(&self, handle: WorkerHandle) -> bool {
        if self.slots.push(handle).is_err() {
            return false;
        }
        // notify_one stores a permit when nobody is waiting, so a put that
        // races the dispatcher between pop and park is never lost
        self.ready.notify_one();
        true
    }

    fn take(&self) -> Option<WorkerHandle> {
        self.slots.pop()
    }

    async fn take_or_shutdown(&self, shutdown: &CancellationToken) -> Option<WorkerHandle> {
        loop {
            if let Some(handle) = self.slots.pop() {
                return Some(handle);
            }
            tokio::select! {
                _ = self.ready.notified() => {}
                _ = shutdown.cancelled() => return None,
            }
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Elastic bounded worker pool.
///
/// Workers are created lazily up to `max_workers` when load arrives, reused
/// through the idle registry while load persists, and torn down one at a
/// time once they sit idle past `idle_timeout`. Tasks are fire-and-forget:
/// no return values, no per-task cancellation, no panic isolation.
pub struct PoolInner {
    queue_tx: mpsc::Sender<Task>,
    idle: IdleRegistry,
    alive: AtomicUsize,
    max_workers: usize,
    idle_timeout: Duration,
    shutdown: CancellationToken,
    submitted: AtomicUsize,
    completed: AtomicUsize,
}

impl PoolInner {
    /// Constructs and starts a pool with the default 10s idle timeout.
    /// Must be called inside a tokio runtime.
    pub fn new(max_workers: usize, max_queue_depth: usize) -> Pool {
        Self::with_config(Config {
            max_workers,
            max_queue_depth,
            ..Default::default()
        })
    }

    /// Constructs and starts a pool. Panics if either size is zero.
    pub fn with_config(config: Config) -> Pool {
        assert!(config.max_workers > 0, "max_workers must be positive");
        assert!(config.max_queue_depth > 0, "max_queue_depth must be positive");

        let (queue_tx, queue_rx) = mpsc::channel(config.max_queue_depth);
        let pool = Arc::new(PoolInner {
            queue_tx,
            idle: IdleRegistry::new(config.max_workers),
            alive: AtomicUsize::new(0),
            max_workers: config.max_workers,
            idle_timeout: config.idle_timeout,
            shutdown: CancellationToken::new(),
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        });

        let dispatcher = pool.clone();
        tokio::spawn(async move {
            dispatcher.dispatch_loop(queue_rx).await;
        });

        pool
    }

    /// Queues a work item for eventual execution (no guarantee it has
    /// started when this returns). Waits up to `idle_timeout` on a full
    /// queue before giving up with [`SubmitError::TooBusy`]; returns
    /// [`SubmitError::Closed`] once shutdown has been signalled.
    pub async fn submit<F>(self: &Arc<Self>, work: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::new(self.clone(), Box::new(work) as Job);
        tokio::select! {
            // closed wins over a free queue slot, so every submit after
            // close() observes Closed
            biased;
            _ = self.shutdown.cancelled() => Err(SubmitError::Closed),
            sent = self.queue_tx.send(task) => match sent {
                Ok(()) => {
                    self.submitted.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                // dispatcher gone, queue receiver dropped
                Err(_) => Err(SubmitError::Closed),
            },
            _ = time::sleep(self.idle_timeout) => Err(SubmitError::TooBusy),
        }
    }

    /// Signals shutdown. Advisory and lossy: the dispatcher and workers exit
    /// at their next wait point, queued and mid-dispatch tasks may never run,
    /// and in-flight tasks finish uninterrupted. Idempotent.
    pub fn close(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::debug!("pool closing");
        }
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            alive_workers: self.alive.load(Ordering::Relaxed),
            idle_workers: self.idle.len(),
            queued_tasks: (self.queue_tx.max_capacity() - self.queue_tx.capacity()),
            submitted_tasks: self.submitted.load(Ordering::Relaxed),
            completed_tasks: self.completed.load(Ordering::Relaxed),
        }
    }

    /// Routing loop: for each queued task, reuse an idle worker, grow the
    /// pool if under the cap, or block until a worker comes free.
    async fn dispatch_loop(self: Arc<Self>, mut queue_rx: mpsc::Receiver<Task>) {
        while let Some(task) = queue_rx.recv().await {
            if self.shutdown.is_cancelled() {
                tracing::trace!("shutdown during dispatch; task abandoned");
                return;
            }

            if let Some(handle) = self.idle.take() {
                self.hand_off(handle, task).await;
                continue;
            }

            if let Some(handle) = self.try_spawn_worker() {
                self.hand_off(handle, task).await;
                continue;
            }

            // at capacity with nobody idle: wait for a recycle, racing
            // shutdown; on shutdown the in-hand task is dropped unreported
            match self.idle.take_or_shutdown(&self.shutdown).await {
                Some(handle) => self.hand_off(handle, task).await,
                None => {
                    tracing::trace!("shutdown while awaiting a worker; task abandoned");
                    return;
                }
            }
        }
    }

    async fn hand_off(&self, handle: WorkerHandle, task: Task) {
        // the slot only closes when the worker exits during shutdown
        if handle.slot.send(task).await.is_err() {
            tracing::trace!("worker exited before hand-off; task dropped");
        }
    }

    /// Reserves an alive-worker slot and spawns a worker for it. The
    /// compare-exchange is the only place the alive count increases, so the
    /// `alive <= max_workers` invariant holds without wider locking.
    fn try_spawn_worker(self: &Arc<Self>) -> Option<WorkerHandle> {
        let mut alive = self.alive.load(Ordering::Acquire);
        loop {
            if alive >= self.max_workers {
                return None;
            }
            match self.alive.compare_exchange_weak(
                alive,
                alive + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => alive = actual,
            }
        }

        let (slot_tx, slot_rx) = mpsc::channel(1);
        let handle = WorkerHandle {
            slot: slot_tx,
            stop: self.shutdown.child_token(),
        };
        tracing::debug!(alive = alive + 1, "worker spawned");

        let worker = self.clone();
        let loop_handle = handle.clone();
        tokio::spawn(async move {
            worker.worker_loop(slot_rx, loop_handle).await;
        });

        Some(handle)
    }

    /// One worker's lifetime: wait for a task, run it, hand the handle back
    /// for reuse; on idle timeout, pressure the pool to shrink by one; on
    /// stop (individual release or pool shutdown), exit.
    async fn worker_loop(self: Arc<Self>, mut slot: mpsc::Receiver<Task>, handle: WorkerHandle) {
        loop {
            tokio::select! {
                received = slot.recv() => match received {
                    Some(task) => {
                        // runs synchronously to completion; a long or
                        // panicking work item stalls or kills this worker
                        let pool = task.run();
                        pool.completed.fetch_add(1, Ordering::Relaxed);
                        pool.recycle(handle.clone());
                    }
                    None => return,
                },
                _ = handle.stop.cancelled() => return,
                _ = time::sleep(self.idle_timeout) => self.release(),
            }
        }
    }

    /// Re-registers a worker for reuse after it finished a task.
    fn recycle(&self, handle: WorkerHandle) {
        if self.shutdown.is_cancelled() || handle.stop.is_cancelled() {
            return;
        }
        if !self.idle.put(handle) {
            tracing::trace!("idle registry full; recycle dropped");
        }
    }

    /// Shrinks the pool by one: pops whichever handle is idle and cancels
    /// it. Timers are fungible pressure signals, so the worker whose idle
    /// timeout fired is not necessarily the one released. No-op when nobody
    /// is registered idle.
    fn release(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if let Some(handle) = self.idle.take() {
            handle.stop.cancel();
            let alive = self.alive.fetch_sub(1, Ordering::AcqRel) - 1;
            tracing::debug!(alive, "idle worker released");
        }
    }
}

static DEFAULT_POOL: LazyLock<Pool> = LazyLock::new(|| PoolInner::new(100, 10_000));

/// The process-wide default pool (100 workers, queue depth 10_000),
/// constructed on first use. First use must happen inside a tokio runtime.
pub fn default_pool() -> &'static Pool {
    &DEFAULT_POOL
}

/// Submits a work item to the default pool. Callers needing their own
/// capacity or queue limits should construct a [`PoolInner`] instead.
pub async fn submit<F>(work: F) -> Result<(), SubmitError>
where
    F: FnOnce() + Send + 'static,
{
    default_pool().submit(work).await
}
