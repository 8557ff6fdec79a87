//! Thread-affine executor
//!
//! Relays units of work from any number of caller threads onto one pinned
//! OS thread, one item at a time, and blocks each caller until its item has
//! run. Native libraries that keep UI or capture state in thread-local
//! storage can then be called "directly" from anywhere.
//!
//! ## Architecture
//!
//! ```text
//! caller A ──┐                         ┌──────────────────────────┐
//! caller B ──┼── Executor::run ──▶ queue ──▶ Pump::drive (pinned)  │
//! caller C ──┘        ▲                │  job(); job(); job(); … │
//!                     └── one-shot ◀───┴──────────────────────────┘
//! ```
//!
//! The pinned thread is whichever thread enters the pump. The executor never
//! spawns a thread of its own: on some platforms only the process entry
//! thread may touch UI state, so `main` is expected to call
//! [`Pump::drive`] and stay there.
//!
//! ## Usage
//!
//! ```no_run
//! use cvbridge_executor::{Executor, ExecutorConfig};
//!
//! let (executor, pump) = Executor::new(ExecutorConfig::default());
//!
//! let worker = std::thread::spawn(move || {
//!     let answer = executor.run(|| 6 * 7).unwrap();
//!     assert_eq!(answer, 42);
//! });
//!
//! // Returns once every Executor clone has been dropped.
//! pump.drive().unwrap();
//! worker.join().unwrap();
//! ```
//!
//! ## Hazards
//!
//! - If no thread ever drives the pump, [`Executor::run`] blocks forever.
//!   A warning is logged after [`ExecutorConfig::stall_warning_ms`].
//! - A work item that never returns hangs the pinned thread and with it
//!   every other caller. There is no timeout or cancellation.

pub mod config;
pub mod error;
pub mod executor;

pub use config::ExecutorConfig;
pub use error::ExecutorError;
pub use executor::{Executor, ExecutorStats, Pump};
