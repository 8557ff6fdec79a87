//! Array copies and per-element arithmetic (cxcore).

use cvbridge_ffi_common::NativePtr;

use crate::arr::{mask_ptr, Arr};
use crate::error::{Error, Result};
use crate::image::Image;
use crate::sys::CvArr;

/// `cvCopy`: copy `src` into `dst`, only where `mask` is non-zero
pub fn copy(src: &impl Arr, dst: &mut impl Arr, mask: Option<&Image>) -> Result<()> {
    let (src, dst_ptr, mask) = (src.arr_ptr(), dst.arr_ptr(), mask_ptr(mask));
    dst.bridge().run("cvCopy", move |api| unsafe {
        api.copy(src.as_ptr(), dst_ptr.as_ptr(), mask.as_ptr())
    })
}

/// `cvConvertScale`: `dst = src * scale + shift`, saturated to `dst`'s depth
pub fn convert_scale(src: &impl Arr, dst: &mut impl Arr, scale: f64, shift: f64) -> Result<()> {
    let (src, dst_ptr) = (src.arr_ptr(), dst.arr_ptr());
    dst.bridge().run("cvConvertScale", move |api| unsafe {
        api.convert_scale(src.as_ptr(), dst_ptr.as_ptr(), scale, shift)
    })
}

/// `cvAnd`: per-element bitwise conjunction
pub fn and(src1: &impl Arr, src2: &impl Arr, dst: &mut impl Arr, mask: Option<&Image>) -> Result<()> {
    let (a, b, dst_ptr, mask) = (src1.arr_ptr(), src2.arr_ptr(), dst.arr_ptr(), mask_ptr(mask));
    dst.bridge().run("cvAnd", move |api| unsafe {
        api.and(a.as_ptr(), b.as_ptr(), dst_ptr.as_ptr(), mask.as_ptr())
    })
}

/// `cvOr`: per-element bitwise disjunction
pub fn or(src1: &impl Arr, src2: &impl Arr, dst: &mut impl Arr, mask: Option<&Image>) -> Result<()> {
    let (a, b, dst_ptr, mask) = (src1.arr_ptr(), src2.arr_ptr(), dst.arr_ptr(), mask_ptr(mask));
    dst.bridge().run("cvOr", move |api| unsafe {
        api.or(a.as_ptr(), b.as_ptr(), dst_ptr.as_ptr(), mask.as_ptr())
    })
}

/// `cvSplit`: one single-channel image per source channel.
///
/// `planes` holds one to four destinations, filled in channel order.
pub fn split(src: &impl Arr, planes: &mut [Image]) -> Result<()> {
    if planes.is_empty() || planes.len() > 4 {
        return Err(Error::InvalidArgument(format!(
            "split takes one to four planes, got {}",
            planes.len()
        )));
    }

    let mut dst = [NativePtr::<CvArr>::null(); 4];
    for (slot, plane) in dst.iter_mut().zip(planes.iter()) {
        *slot = plane.arr_ptr();
    }
    let src = src.arr_ptr();
    planes[0].bridge().run("cvSplit", move |api| unsafe {
        api.split(
            src.as_ptr(),
            dst[0].as_ptr(),
            dst[1].as_ptr(),
            dst[2].as_ptr(),
            dst[3].as_ptr(),
        )
    })
}
