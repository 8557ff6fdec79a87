//! Capture sources and the frames they lend out.

use std::marker::PhantomData;
use std::path::Path;

use cvbridge_ffi_common::{cstring_from_path, NativePtr};
use image::DynamicImage;
use tracing::debug;

use crate::arr::Arr;
use crate::bridge::Bridge;
use crate::error::Result;
use crate::handle::{CaptureKind, Handle, ImageKind};
use crate::image::{self as img, Image, ImageInfo};
use crate::sys::CvArr;
use crate::types::Size;

/// An owned camera or video file source.
#[derive(Debug)]
pub struct Capture {
    handle: Handle<CaptureKind>,
}

impl Capture {
    /// `cvCreateCameraCapture`; a negative index picks any camera
    pub fn from_camera(bridge: &Bridge, index: i32) -> Result<Self> {
        let handle = bridge.create::<CaptureKind, _>("cvCreateCameraCapture", move |api| unsafe {
            api.create_camera_capture(index)
        })?;
        debug!(index, "opened camera");
        Ok(Self { handle })
    }

    /// `cvCreateFileCapture`
    pub fn from_file(bridge: &Bridge, path: impl AsRef<Path>) -> Result<Self> {
        let name = cstring_from_path(path.as_ref())?;
        let handle = bridge.create::<CaptureKind, _>("cvCreateFileCapture", move |api| unsafe {
            api.create_file_capture(name.as_ptr())
        })?;
        debug!(path = %path.as_ref().display(), "opened video file");
        Ok(Self { handle })
    }

    pub fn handle(&self) -> &Handle<CaptureKind> {
        &self.handle
    }

    /// `cvQueryFrame`: the next frame, or `None` at end of stream.
    ///
    /// The frame buffer belongs to the capture and is overwritten by the
    /// next query, so the frame borrows the capture mutably.
    pub fn query_frame(&mut self) -> Result<Option<Frame<'_>>> {
        let ptr = self.handle.as_raw();
        let frame = self
            .handle
            .bridge()
            .borrow::<ImageKind, _>("cvQueryFrame", move |api| unsafe {
                api.query_frame(ptr.as_ptr())
            })?;
        Ok(frame.map(|handle| Frame {
            handle,
            _capture: PhantomData,
        }))
    }

    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

/// A frame lent by a [`Capture`], valid until the next query.
#[derive(Debug)]
pub struct Frame<'c> {
    handle: Handle<ImageKind>,
    _capture: PhantomData<&'c mut Capture>,
}

impl Frame<'_> {
    pub fn handle(&self) -> &Handle<ImageKind> {
        &self.handle
    }

    pub fn size(&self) -> Result<Size> {
        img::read_size(self.bridge(), self.arr_ptr())
    }

    pub fn info(&self) -> Result<ImageInfo> {
        img::read_info(&self.handle)
    }

    /// Deep copy into an owned image that outlives the capture
    pub fn to_image(&self) -> Result<Image> {
        img::clone_from(&self.handle)
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        img::download(&self.handle)
    }
}

impl Arr for Frame<'_> {
    fn bridge(&self) -> &Bridge {
        self.handle.bridge()
    }

    fn arr_ptr(&self) -> NativePtr<CvArr> {
        self.handle.as_raw().cast()
    }
}
