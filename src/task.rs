use super::pool::Pool;

/// A submitted unit of work: a fire-and-forget, no-argument procedure.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// One queued work item plus a back-reference to its owning pool.
///
/// The back-reference exists only so the worker that ran the task can hand
/// itself back to the correct idle registry afterwards. Tasks are created
/// fresh per submission and never retried or requeued by the pool.
pub(crate) struct Task {
    pool: Pool,
    job: Job,
}

impl Task {
    pub(crate) fn new(pool: Pool, job: Job) -> Self {
        Self { pool, job }
    }

    /// Runs the work item to completion and yields the owning pool.
    pub(crate) fn run(self) -> Pool {
        (self.job)();
        self.pool
    }
}
