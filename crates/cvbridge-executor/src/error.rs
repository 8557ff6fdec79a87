//! Error types for the executor

use thiserror::Error;

/// Errors reported to callers of the executor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The pump was dropped; queued and future work cannot run
    #[error("executor pump has stopped")]
    Stopped,

    /// The work item panicked on the pinned thread
    #[error("work item panicked: {message}")]
    Panicked { message: String },

    /// The pump was entered from a thread other than the pinned one
    #[error("pump is pinned to another thread")]
    WrongThread,

    /// `require_main_thread` is set and the pump was entered elsewhere
    #[error("pump must be driven from the main thread, not '{thread}'")]
    NotMainThread { thread: String },
}
