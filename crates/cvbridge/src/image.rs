//! Owned native images (`IplImage`).

use std::os::raw::c_int;

use cvbridge_ffi_common::NativePtr;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::arr::Arr;
use crate::bridge::Bridge;
use crate::convert;
use crate::error::{Error, Result};
use crate::handle::{Handle, ImageKind};
use crate::sys::{
    CvArr, CvRect, CvSize, IPL_DEPTH_16S, IPL_DEPTH_16U, IPL_DEPTH_32F, IPL_DEPTH_32S, IPL_DEPTH_64F,
    IPL_DEPTH_8S, IPL_DEPTH_8U,
};
use crate::types::{Rect, Size};

/// Pixel depth (`IPL_DEPTH_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Depth {
    U8,
    S8,
    U16,
    S16,
    S32,
    F32,
    F64,
}

impl Depth {
    pub fn raw(self) -> c_int {
        match self {
            Depth::U8 => IPL_DEPTH_8U,
            Depth::S8 => IPL_DEPTH_8S,
            Depth::U16 => IPL_DEPTH_16U,
            Depth::S16 => IPL_DEPTH_16S,
            Depth::S32 => IPL_DEPTH_32S,
            Depth::F32 => IPL_DEPTH_32F,
            Depth::F64 => IPL_DEPTH_64F,
        }
    }

    pub fn from_raw(raw: c_int) -> Option<Self> {
        Some(match raw {
            IPL_DEPTH_8U => Depth::U8,
            IPL_DEPTH_8S => Depth::S8,
            IPL_DEPTH_16U => Depth::U16,
            IPL_DEPTH_16S => Depth::S16,
            IPL_DEPTH_32S => Depth::S32,
            IPL_DEPTH_32F => Depth::F32,
            IPL_DEPTH_64F => Depth::F64,
            _ => return None,
        })
    }

    /// Bits per channel
    pub fn bits(self) -> u32 {
        (self.raw() & 0xff) as u32
    }
}

/// Snapshot of an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    pub depth: Depth,
    /// Bytes per row including padding
    pub width_step: i32,
    pub image_size: i32,
    pub roi: Option<Rect>,
    /// Channel of interest, 0 for all
    pub coi: i32,
}

/// Read the header of a live image on the pinned thread.
pub(crate) fn read_info(handle: &Handle<ImageKind>) -> Result<ImageInfo> {
    let ptr = handle.as_raw();
    let (width, height, channels, depth, width_step, image_size, roi) =
        handle.bridge().run("read image header", move |_api| unsafe {
            let header = &*ptr.as_ptr();
            let roi = (!header.roi.is_null()).then(|| *header.roi);
            (
                header.width,
                header.height,
                header.n_channels,
                header.depth,
                header.width_step,
                header.image_size,
                roi,
            )
        })?;

    Ok(ImageInfo {
        width,
        height,
        channels,
        depth: Depth::from_raw(depth).ok_or(Error::UnsupportedFormat { depth, channels })?,
        width_step,
        image_size,
        roi: roi.map(|r| Rect::new(r.x_offset, r.y_offset, r.width, r.height)),
        coi: roi.map_or(0, |r| r.coi),
    })
}

/// `cvGetSize`: the region of interest when one is set
pub(crate) fn read_size(bridge: &Bridge, arr: NativePtr<CvArr>) -> Result<Size> {
    let size = bridge.run("cvGetSize", move |api| unsafe { api.get_size(arr.as_ptr()) })?;
    Ok(size.into())
}

pub(crate) fn clone_from(handle: &Handle<ImageKind>) -> Result<Image> {
    let ptr = handle.as_raw();
    let handle = handle
        .bridge()
        .create::<ImageKind, _>("cvCloneImage", move |api| unsafe { api.clone_image(ptr.as_ptr()) })?;
    Ok(Image { handle })
}

pub(crate) fn download(handle: &Handle<ImageKind>) -> Result<DynamicImage> {
    let ptr = handle.as_raw();
    handle
        .bridge()
        .run("read image pixels", move |_api| unsafe { convert::read_image(ptr.as_ptr()) })?
}

/// An image owned by the bridge, released on drop.
#[derive(Debug)]
pub struct Image {
    handle: Handle<ImageKind>,
}

impl Image {
    /// `cvCreateImage`: a zero-filled image with rows padded to 4 bytes
    pub fn new(bridge: &Bridge, size: Size, depth: Depth, channels: i32) -> Result<Self> {
        let size: CvSize = size.into();
        let depth = depth.raw();
        let handle = bridge.create::<ImageKind, _>("cvCreateImage", move |api| unsafe {
            api.create_image(size, depth, channels)
        })?;
        Ok(Self { handle })
    }

    /// Wrap an owned image handle.
    pub fn from_handle(handle: Handle<ImageKind>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle<ImageKind> {
        &self.handle
    }

    pub fn into_handle(self) -> Handle<ImageKind> {
        self.handle
    }

    /// Width and height, or those of the region of interest when set
    pub fn size(&self) -> Result<Size> {
        read_size(self.bridge(), self.arr_ptr())
    }

    pub fn info(&self) -> Result<ImageInfo> {
        read_info(&self.handle)
    }

    /// `cvCloneImage`: a deep copy including the region of interest
    pub fn try_clone(&self) -> Result<Image> {
        clone_from(&self.handle)
    }

    /// Restrict channel-aware operations to one channel (1-based, 0 for all)
    pub fn set_coi(&mut self, coi: i32) -> Result<()> {
        let ptr = self.handle.as_raw();
        self.bridge()
            .run("cvSetImageCOI", move |api| unsafe { api.set_image_coi(ptr.as_ptr(), coi) })
    }

    /// Restrict operations to `rect`, clipped to the image
    pub fn set_roi(&mut self, rect: Rect) -> Result<()> {
        let ptr = self.handle.as_raw();
        let rect: CvRect = rect.into();
        self.bridge()
            .run("cvSetImageROI", move |api| unsafe { api.set_image_roi(ptr.as_ptr(), rect) })
    }

    pub fn reset_roi(&mut self) -> Result<()> {
        let ptr = self.handle.as_raw();
        self.bridge()
            .run("cvResetImageROI", move |api| unsafe { api.reset_image_roi(ptr.as_ptr()) })
    }

    /// Upload a host image as an 8-bit native image (gray, BGR or BGRA).
    pub fn from_dynamic(bridge: &Bridge, host: &DynamicImage) -> Result<Self> {
        let channels = convert::channels_for(host);
        let packed = convert::pack_host(host, channels)?;
        let size = Size::new(
            i32::try_from(host.width()).map_err(|_| Error::InvalidArgument("image too wide".into()))?,
            i32::try_from(host.height())
                .map_err(|_| Error::InvalidArgument("image too tall".into()))?,
        );

        let image = Self::new(bridge, size, Depth::U8, channels)?;
        let ptr = image.handle.as_raw();
        bridge.run("write image pixels", move |_api| unsafe {
            convert::write_rows(ptr.as_ptr(), &packed)
        })??;
        Ok(image)
    }

    /// Download the whole image (region of interest ignored) as a host image.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        download(&self.handle)
    }

    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

impl Arr for Image {
    fn bridge(&self) -> &Bridge {
        self.handle.bridge()
    }

    fn arr_ptr(&self) -> NativePtr<CvArr> {
        self.handle.as_raw().cast()
    }
}
