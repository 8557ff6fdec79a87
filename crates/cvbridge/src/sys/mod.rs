//! Raw ABI surface of the native library: records and constants.
//!
//! Nothing in this module is safe to dereference off the pinned thread.

pub mod consts;
pub mod types;

pub use consts::*;
pub use types::*;
