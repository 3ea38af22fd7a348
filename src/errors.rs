use thiserror::Error;

/// Errors returned synchronously by `submit`.
///
/// Task execution failures are never reported here: work items are opaque
/// procedures and any failure handling belongs to the work item itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The submission queue stayed full for the whole wait window.
    /// Backpressure signal: retry later or degrade.
    #[error("pool is too busy, retry later")]
    TooBusy,
    /// The pool has been closed; no new work is accepted.
    #[error("pool is closed")]
    Closed,
}
