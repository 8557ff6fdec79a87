//! Fixed-level thresholding.

use std::os::raw::c_int;

use crate::arr::Arr;
use crate::error::Result;
use crate::sys::{
    CV_THRESH_BINARY, CV_THRESH_BINARY_INV, CV_THRESH_OTSU, CV_THRESH_TOZERO, CV_THRESH_TOZERO_INV,
    CV_THRESH_TRUNC,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThresholdType {
    /// `max_value` above the threshold, else 0
    #[default]
    Binary,
    /// 0 above the threshold, else `max_value`
    BinaryInv,
    /// Threshold above it, else unchanged
    Trunc,
    /// Unchanged above it, else 0
    ToZero,
    /// 0 above it, else unchanged
    ToZeroInv,
}

impl ThresholdType {
    pub fn raw(self) -> c_int {
        match self {
            ThresholdType::Binary => CV_THRESH_BINARY,
            ThresholdType::BinaryInv => CV_THRESH_BINARY_INV,
            ThresholdType::Trunc => CV_THRESH_TRUNC,
            ThresholdType::ToZero => CV_THRESH_TOZERO,
            ThresholdType::ToZeroInv => CV_THRESH_TOZERO_INV,
        }
    }
}

/// `cvThreshold`; returns the threshold applied
pub fn threshold(
    src: &impl Arr,
    dst: &mut impl Arr,
    threshold: f64,
    max_value: f64,
    kind: ThresholdType,
) -> Result<f64> {
    run(src, dst, threshold, max_value, kind.raw())
}

/// `cvThreshold` with `CV_THRESH_OTSU`: the level is computed from the
/// histogram (8-bit single-channel sources only) and returned.
pub fn threshold_otsu(
    src: &impl Arr,
    dst: &mut impl Arr,
    max_value: f64,
    kind: ThresholdType,
) -> Result<f64> {
    run(src, dst, 0.0, max_value, kind.raw() | CV_THRESH_OTSU)
}

fn run(src: &impl Arr, dst: &mut impl Arr, level: f64, max_value: f64, flags: c_int) -> Result<f64> {
    let (src, dst_ptr) = (src.arr_ptr(), dst.arr_ptr());
    dst.bridge().run("cvThreshold", move |api| unsafe {
        api.threshold(src.as_ptr(), dst_ptr.as_ptr(), level, max_value, flags)
    })
}
