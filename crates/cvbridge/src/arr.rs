//! Generic array arguments.

use cvbridge_ffi_common::NativePtr;

use crate::bridge::Bridge;
use crate::sys::CvArr;

/// Anything the native library accepts as a `CvArr*`: images, frames and
/// sequences.
pub trait Arr {
    /// Bridge that owns the object
    fn bridge(&self) -> &Bridge;

    /// Address passed as the `CvArr*` argument
    fn arr_ptr(&self) -> NativePtr<CvArr>;
}

/// Address of an optional mask argument, null when absent
pub(crate) fn mask_ptr<A: Arr>(mask: Option<&A>) -> NativePtr<CvArr> {
    mask.map_or(NativePtr::null(), Arr::arr_ptr)
}
