//! Logging setup for cvbridge programs.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used by [`init`]: bridge and executor events at `info`, everything
/// else at `warn`.
pub const DEFAULT_FILTER: &str = "warn,cvbridge=info,cvbridge_executor=info";

/// Initialize tracing with [`DEFAULT_FILTER`].
///
/// Per-call native events are logged at `debug` under the `cvbridge` target;
/// `RUST_LOG=cvbridge=debug` shows them.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Initialize tracing with a custom default filter.
///
/// `RUST_LOG` wins when set. Lines carry the thread name, so work done on
/// the pinned thread can be told apart from the callers. A second call
/// leaves the first subscriber in place.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_thread_names(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init_with_filter("debug");
    }
}
