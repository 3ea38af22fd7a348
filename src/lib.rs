//! Elastic bounded worker pool for fire-and-forget callbacks.
//!
//! # Design goals
//! - Hard cap on concurrent workers
//! - Lazy growth under load bursts, automatic shrink after idleness
//! - Bounded submission queue with backpressure (`TooBusy`) instead of
//!   unbounded buffering
//! - One-shot broadcast shutdown; advisory and lossy by design (queued
//!   tasks may be dropped, in-flight tasks finish uninterrupted)
//!
//! Worker lifecycle: spawned --> busy --> idle --> released.
//!
//! Tasks are opaque no-argument procedures: no return values, no per-task
//! cancellation, no panic isolation. A panicking work item takes its worker
//! down with it.

pub mod errors;
pub mod model;
pub mod pool;
pub mod task;

pub use errors::SubmitError;
pub use model::PoolMetrics;
pub use pool::{default_pool, submit, Config, Pool, PoolInner};
pub use task::Job;
