//! Gaussian pyramid steps.

use std::os::raw::c_int;

use crate::arr::Arr;
use crate::error::Result;
use crate::sys::CV_GAUSSIAN_5X5;

/// Pyramid smoothing filter; only the 5x5 Gaussian exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PyramidFilter {
    #[default]
    Gaussian5x5,
}

impl PyramidFilter {
    pub fn raw(self) -> c_int {
        match self {
            PyramidFilter::Gaussian5x5 => CV_GAUSSIAN_5X5,
        }
    }
}

/// `cvPyrDown`: blur and halve; `dst` must be `src`'s size halved
pub fn pyr_down(src: &impl Arr, dst: &mut impl Arr, filter: PyramidFilter) -> Result<()> {
    let (src, dst_ptr, filter) = (src.arr_ptr(), dst.arr_ptr(), filter.raw());
    dst.bridge().run("cvPyrDown", move |api| unsafe {
        api.pyr_down(src.as_ptr(), dst_ptr.as_ptr(), filter)
    })
}

/// `cvPyrUp`: upsample and blur; `dst` must be `src`'s size doubled
pub fn pyr_up(src: &impl Arr, dst: &mut impl Arr, filter: PyramidFilter) -> Result<()> {
    let (src, dst_ptr, filter) = (src.arr_ptr(), dst.arr_ptr(), filter.raw());
    dst.bridge().run("cvPyrUp", move |api| unsafe {
        api.pyr_up(src.as_ptr(), dst_ptr.as_ptr(), filter)
    })
}
