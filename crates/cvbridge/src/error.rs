//! Error types for the native bridge.

use std::ffi::NulError;

use cvbridge_executor::ExecutorError;
use thiserror::Error;

/// Error type for bridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A create call returned null; `status` holds the native error status
    /// the call left behind, if any
    #[error("{operation}: native library returned no {kind}{}", status_suffix(.status))]
    AllocationFailed {
        kind: &'static str,
        operation: &'static str,
        status: Option<NativeStatus>,
    },

    /// The native error status was negative after a call
    #[error("{operation} failed with status {code}: {message}")]
    OperationFailed {
        operation: &'static str,
        code: i32,
        message: String,
    },

    /// A raw pointer could not be adopted as a handle
    #[error("invalid {kind} handle: {reason}")]
    InvalidHandle {
        kind: &'static str,
        reason: &'static str,
    },

    /// The executor could not run the call
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// A name or path contained an interior null byte
    #[error("invalid C string: {0}")]
    InvalidString(#[from] NulError),

    #[error("index {index} out of range for sequence of {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Element type does not match the sequence's element size
    #[error("element size mismatch: sequence stores {expected} bytes, element has {actual}")]
    ElementSize { expected: usize, actual: usize },

    /// Pixel layout the host conversion cannot express
    #[error("unsupported pixel format: depth {depth}, {channels} channels")]
    UnsupportedFormat { depth: i32, channels: i32 },

    /// Image codec error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Argument rejected before reaching the native library
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A negative native error status and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeStatus {
    pub code: i32,
    pub message: String,
}

impl NativeStatus {
    /// Report this status as the failure of `operation`
    pub fn into_error(self, operation: &'static str) -> Error {
        Error::OperationFailed {
            operation,
            code: self.code,
            message: self.message,
        }
    }
}

fn status_suffix(status: &Option<NativeStatus>) -> String {
    match status {
        Some(status) => format!(" (status {}: {})", status.code, status.message),
        None => String::new(),
    }
}

/// Result type alias using the bridge Error.
pub type Result<T> = std::result::Result<T, Error>;
