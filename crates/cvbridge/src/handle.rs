//! Ownership-tagged native handles
//!
//! A [`Handle<K>`] carries the address of one native object of kind `K`
//! together with an [`Ownership`] tag fixed when the handle is made:
//!
//! | Tag        | Made by                 | On release / drop            |
//! |------------|-------------------------|------------------------------|
//! | `Owned`    | [`Bridge::create`]      | native release, exactly once |
//! | `Borrowed` | [`Bridge::borrow`]      | nothing                      |
//! | `Pooled`   | [`Bridge::from_pool`]   | nothing (arena frees it)     |
//!
//! `release` consumes the handle, so a second release does not compile.
//! Dropping an owned handle releases it through the executor; failures at
//! that point can only be logged.
//!
//! A borrowed or pooled handle says nothing about how long its address
//! stays valid. The typed wrappers ([`Frame`](crate::Frame),
//! [`Seq`](crate::Seq)) attach that lifetime with a borrow.

use std::fmt;

use cvbridge_ffi_common::NativePtr;
use tracing::{debug, error};

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::native::NativeApi;
use crate::sys::{CvCapture, CvMemStorage, CvSeq, IplConvKernel, IplImage};

/// Who frees the native object behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Created by the bridge; released exactly once
    Owned,
    /// Lent by the native library; never freed by the bridge
    Borrowed,
    /// Carved from a memory storage; freed with the storage
    Pooled,
}

impl Ownership {
    /// Whether the bridge frees objects with this tag
    pub fn frees_native(self) -> bool {
        self == Ownership::Owned
    }
}

/// A kind of native object and how to free one.
pub trait NativeKind: Send + Sync + 'static {
    /// The native record type
    type Raw: 'static;

    /// Kind name used in errors and logs
    const NAME: &'static str;

    /// Native release entry point, for errors and logs
    const RELEASE: &'static str;

    /// Whether objects of this kind can be released individually
    const RELEASABLE: bool = true;

    /// Free one object.
    ///
    /// # Safety
    /// Must run on the pinned thread with a live, owned object.
    unsafe fn release(api: &dyn NativeApi, raw: *mut Self::Raw);
}

/// `IplImage` created by `cvCreateImage` and friends
#[derive(Debug)]
pub struct ImageKind;

impl NativeKind for ImageKind {
    type Raw = IplImage;
    const NAME: &'static str = "image";
    const RELEASE: &'static str = "cvReleaseImage";

    unsafe fn release(api: &dyn NativeApi, raw: *mut IplImage) {
        let mut raw = raw;
        api.release_image(&mut raw);
    }
}

/// `CvMemStorage`
#[derive(Debug)]
pub struct StorageKind;

impl NativeKind for StorageKind {
    type Raw = CvMemStorage;
    const NAME: &'static str = "memory storage";
    const RELEASE: &'static str = "cvReleaseMemStorage";

    unsafe fn release(api: &dyn NativeApi, raw: *mut CvMemStorage) {
        let mut raw = raw;
        api.release_mem_storage(&mut raw);
    }
}

/// `CvSeq`, always pooled or borrowed
#[derive(Debug)]
pub struct SeqKind;

impl NativeKind for SeqKind {
    type Raw = CvSeq;
    const NAME: &'static str = "sequence";
    const RELEASE: &'static str = "cvReleaseMemStorage";
    const RELEASABLE: bool = false;

    unsafe fn release(_api: &dyn NativeApi, _raw: *mut CvSeq) {}
}

/// `CvCapture`
#[derive(Debug)]
pub struct CaptureKind;

impl NativeKind for CaptureKind {
    type Raw = CvCapture;
    const NAME: &'static str = "capture";
    const RELEASE: &'static str = "cvReleaseCapture";

    unsafe fn release(api: &dyn NativeApi, raw: *mut CvCapture) {
        let mut raw = raw;
        api.release_capture(&mut raw);
    }
}

/// `IplConvKernel`
#[derive(Debug)]
pub struct KernelKind;

impl NativeKind for KernelKind {
    type Raw = IplConvKernel;
    const NAME: &'static str = "structuring element";
    const RELEASE: &'static str = "cvReleaseStructuringElement";

    unsafe fn release(api: &dyn NativeApi, raw: *mut IplConvKernel) {
        let mut raw = raw;
        api.release_structuring_element(&mut raw);
    }
}

/// Address of a native object plus its ownership tag.
pub struct Handle<K: NativeKind> {
    ptr: NativePtr<K::Raw>,
    ownership: Ownership,
    bridge: Bridge,
}

impl<K: NativeKind> Handle<K> {
    pub(crate) fn new(bridge: Bridge, ptr: NativePtr<K::Raw>, ownership: Ownership) -> Self {
        Self {
            ptr,
            ownership,
            bridge,
        }
    }

    /// Adopt a raw pointer obtained outside the bridge.
    ///
    /// Fails with [`Error::InvalidHandle`] for null, or for `Owned` on a
    /// kind that cannot be released individually.
    ///
    /// # Safety
    /// `raw` must point to a live object of kind `K`. With `Owned`, nothing
    /// else may free it.
    pub unsafe fn from_raw(bridge: &Bridge, raw: *mut K::Raw, ownership: Ownership) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::InvalidHandle {
                kind: K::NAME,
                reason: "null pointer",
            });
        }
        if ownership == Ownership::Owned && !K::RELEASABLE {
            return Err(Error::InvalidHandle {
                kind: K::NAME,
                reason: "objects of this kind are freed with their storage",
            });
        }
        Ok(Self::new(bridge.clone(), NativePtr::new(raw), ownership))
    }

    /// Give up the pointer without releasing it
    pub fn into_raw(mut self) -> *mut K::Raw {
        std::mem::replace(&mut self.ptr, NativePtr::null()).as_ptr()
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn as_raw(&self) -> NativePtr<K::Raw> {
        self.ptr
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Release the native object now.
    ///
    /// Owned handles call the kind's native release on the pinned thread;
    /// borrowed and pooled handles are simply forgotten.
    pub fn release(mut self) -> Result<()> {
        let ptr = std::mem::replace(&mut self.ptr, NativePtr::null());
        self.release_ptr(ptr)
    }

    fn release_ptr(&self, ptr: NativePtr<K::Raw>) -> Result<()> {
        if ptr.is_null() || !self.ownership.frees_native() {
            return Ok(());
        }
        self.bridge.release_raw::<K>(ptr)?;
        debug!(kind = K::NAME, addr = ptr.addr(), "released native object");
        Ok(())
    }
}

impl<K: NativeKind> Drop for Handle<K> {
    fn drop(&mut self) {
        let ptr = std::mem::replace(&mut self.ptr, NativePtr::null());
        if let Err(e) = self.release_ptr(ptr) {
            error!(kind = K::NAME, error = %e, "failed to release native object");
        }
    }
}

impl<K: NativeKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &K::NAME)
            .field("ptr", &self.ptr)
            .field("ownership", &self.ownership)
            .finish()
    }
}
