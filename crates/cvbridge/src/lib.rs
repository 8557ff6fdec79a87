//! cvbridge: thread-affine bindings to the OpenCV 2.x C API
//!
//! The native library keeps window, event and capture state per thread, so
//! every native call made through this crate runs on one pinned thread via
//! [`cvbridge_executor`]. Callers on any thread hold typed handles and call
//! ordinary blocking functions.
//!
//! ## Architecture
//!
//! ```text
//! Image / Capture / Seq / ops::*
//!          │  (NativePtr + closure)
//!          ▼
//!       Bridge::run ──▶ Executor ──▶ pinned thread ──▶ NativeApi
//!                                                     ├─ OpenCv (feature "opencv")
//!                                                     └─ SoftwareBackend
//! ```
//!
//! ## Ownership
//!
//! Every native object is reached through a [`Handle`] tagged `Owned`,
//! `Borrowed` or `Pooled` (see [`handle`]). Only owned handles are freed by
//! the bridge; frames lent by a capture and sequences carved from a storage
//! are tied to their owner by a Rust lifetime instead.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use cvbridge::{Bridge, BridgeConfig, Depth, Image, Size, SoftwareBackend};
//!
//! let (bridge, pump) = Bridge::start(BridgeConfig::default(), Arc::new(SoftwareBackend::new()));
//!
//! let worker = std::thread::spawn(move || {
//!     let image = Image::new(&bridge, Size::new(4, 4), Depth::U8, 3)?;
//!     assert_eq!(image.size()?, Size::new(4, 4));
//!     image.release()
//! });
//!
//! pump.drive().unwrap();
//! worker.join().unwrap().unwrap();
//! ```

pub mod arr;
pub mod bridge;
pub mod capture;
pub mod config;
mod convert;
pub mod error;
pub mod handle;
pub mod highgui;
pub mod image;
pub mod logging;
pub mod native;
pub mod ops;
pub mod storage;
pub mod sys;
pub mod types;

pub use arr::Arr;
pub use bridge::Bridge;
pub use capture::{Capture, Frame};
pub use config::BridgeConfig;
pub use error::{Error, NativeStatus, Result};
pub use handle::{CaptureKind, Handle, ImageKind, KernelKind, NativeKind, Ownership, SeqKind, StorageKind};
pub use highgui::{destroy_all_windows, load_image, save_image, wait_key, LoadMode, Window, WindowFlags};
pub use image::{Depth, Image, ImageInfo};
pub use native::{ClipSpec, NativeApi, SoftwareBackend, SoftwareStats, WindowInfo};
#[cfg(feature = "opencv")]
pub use native::OpenCv;
pub use storage::{MemStorage, Seq};
pub use types::{
    Point, Point2D32f, Point2D64f, Point3D32f, Point3D64f, Rect, Scalar, Size, Size2D32f, Slice,
};

pub use cvbridge_executor::{Executor, ExecutorConfig, ExecutorError, Pump};
