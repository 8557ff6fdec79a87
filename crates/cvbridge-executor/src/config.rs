//! Executor configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay before a blocked caller logs a stall warning
pub const DEFAULT_STALL_WARNING_MS: u64 = 5_000;

/// Configuration for [`Executor::new`](crate::Executor::new)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Label used in log output
    pub name: String,
    /// Maximum queued work items (None for unbounded). Submitters block while full.
    pub queue_capacity: Option<usize>,
    /// Milliseconds a caller waits before logging a stall warning (0 disables)
    pub stall_warning_ms: u64,
    /// Reject pump entry from any thread not named "main"
    pub require_main_thread: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "cvbridge".to_string(),
            queue_capacity: None,
            stall_warning_ms: DEFAULT_STALL_WARNING_MS,
            require_main_thread: false,
        }
    }
}

impl ExecutorConfig {
    /// Stall warning delay, or None when disabled
    pub fn stall_warning(&self) -> Option<Duration> {
        (self.stall_warning_ms > 0).then(|| Duration::from_millis(self.stall_warning_ms))
    }
}
