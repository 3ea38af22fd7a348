/// Point-in-time snapshot of pool state.
///
/// Counters are relaxed atomics sampled independently; a snapshot is
/// advisory and the fields may be mutually inconsistent under load.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Workers currently alive (busy or idle), bounded by `max_workers`.
    pub alive_workers: usize,
    /// Workers currently registered for reuse.
    pub idle_workers: usize,
    /// Tasks sitting in the submission queue, not yet dispatched.
    pub queued_tasks: usize,
    /// Tasks accepted by `submit` since the pool started.
    pub submitted_tasks: usize,
    /// Tasks that ran to completion.
    pub completed_tasks: usize,
}

impl PoolMetrics {
    /// Fraction of alive workers currently executing a task.
    pub fn utilization(&self) -> f64 {
        if self.alive_workers == 0 {
            return 0.0;
        }
        let busy = self.alive_workers.saturating_sub(self.idle_workers);
        busy as f64 / self.alive_workers as f64
    }

    /// Tasks accepted but not yet finished (queued, in hand-off, or running).
    pub fn pending(&self) -> usize {
        self.submitted_tasks.saturating_sub(self.completed_tasks)
    }
}
