//! Pixel movement between host images and native image buffers.
//!
//! Native images are interleaved, 8 bits per channel for everything handled
//! here, stored BGR/BGRA, and each row is padded to `width_step` bytes. Host
//! images (`image` crate) are tightly packed RGB/RGBA.

use std::os::raw::c_int;
use std::ptr;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::sys::{IplImage, IPL_DATA_ORDER_PIXEL, IPL_DEPTH_8U};

/// Native channel count used to hold `image`
pub(crate) fn channels_for(image: &DynamicImage) -> c_int {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => 1,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => 1,
        DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageRgba32F(_) => 4,
        _ => 3,
    }
}

/// Tightly packed rows of `image` in native channel order.
pub(crate) fn pack_host(image: &DynamicImage, channels: c_int) -> Result<Vec<u8>> {
    match channels {
        1 => Ok(image.to_luma8().into_raw()),
        3 => {
            let mut data = image.to_rgb8().into_raw();
            data.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
            Ok(data)
        }
        4 => {
            let mut data = image.to_rgba8().into_raw();
            data.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
            Ok(data)
        }
        _ => Err(Error::UnsupportedFormat {
            depth: IPL_DEPTH_8U,
            channels,
        }),
    }
}

fn check_layout(header: &IplImage) -> Result<()> {
    let supported = header.depth == IPL_DEPTH_8U
        && matches!(header.n_channels, 1 | 3 | 4)
        && header.data_order == IPL_DATA_ORDER_PIXEL;
    if supported {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat {
            depth: header.depth,
            channels: header.n_channels,
        })
    }
}

/// Copy tightly packed rows into a native image, honouring row padding.
///
/// # Safety
/// `header` must point to a live image whose dimensions match `packed`.
pub(crate) unsafe fn write_rows(header: *mut IplImage, packed: &[u8]) -> Result<()> {
    let header = &*header;
    check_layout(header)?;

    let row = header.width as usize * header.n_channels as usize;
    let step = header.width_step as usize;
    if packed.len() != row * header.height as usize {
        return Err(Error::UnsupportedFormat {
            depth: header.depth,
            channels: header.n_channels,
        });
    }

    let base = header.image_data as *mut u8;
    for (y, src) in packed.chunks_exact(row).enumerate() {
        ptr::copy_nonoverlapping(src.as_ptr(), base.add(y * step), row);
    }
    Ok(())
}

/// Read a whole native image (region of interest ignored) into a host image.
///
/// # Safety
/// `header` must point to a live image.
pub(crate) unsafe fn read_image(header: *const IplImage) -> Result<DynamicImage> {
    let header = &*header;
    check_layout(header)?;

    let width = header.width as usize;
    let height = header.height as usize;
    let channels = header.n_channels as usize;
    let row = width * channels;
    let step = header.width_step as usize;

    let mut data = Vec::with_capacity(row * height);
    let base = header.image_data as *const u8;
    for y in 0..height {
        data.extend_from_slice(std::slice::from_raw_parts(base.add(y * step), row));
    }
    if channels >= 3 {
        data.chunks_exact_mut(channels).for_each(|px| px.swap(0, 2));
    }

    let (w, h) = (width as u32, height as u32);
    let format_error = || Error::UnsupportedFormat {
        depth: header.depth,
        channels: header.n_channels,
    };
    let image = match channels {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, data).ok_or_else(format_error)?),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, data).ok_or_else(format_error)?),
        _ => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, data).ok_or_else(format_error)?),
    };
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, Rgba};

    #[test]
    fn test_pack_host_swaps_to_bgr() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 1, Rgb([10, 20, 30])));
        assert_eq!(channels_for(&img), 3);
        assert_eq!(pack_host(&img, 3).unwrap(), vec![30, 20, 10, 30, 20, 10]);
    }

    #[test]
    fn test_pack_host_rgba_keeps_alpha_last() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4])));
        assert_eq!(channels_for(&img), 4);
        assert_eq!(pack_host(&img, 4).unwrap(), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_pack_host_gray() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([7])));
        assert_eq!(channels_for(&img), 1);
        assert_eq!(pack_host(&img, 1).unwrap(), vec![7; 6]);
    }

    #[test]
    fn test_pack_host_rejects_two_channels() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(1, 1));
        assert!(matches!(
            pack_host(&img, 2),
            Err(Error::UnsupportedFormat { channels: 2, .. })
        ));
    }
}
