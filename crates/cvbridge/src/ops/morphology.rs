//! Structuring elements and morphological filters.

use std::os::raw::c_int;

use cvbridge_ffi_common::NativePtr;

use crate::arr::Arr;
use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::handle::{Handle, KernelKind};
use crate::image::Image;
use crate::sys::{
    IplConvKernel, CV_MOP_BLACKHAT, CV_MOP_CLOSE, CV_MOP_DILATE, CV_MOP_ERODE, CV_MOP_GRADIENT,
    CV_MOP_OPEN, CV_MOP_TOPHAT, CV_SHAPE_CROSS, CV_SHAPE_CUSTOM, CV_SHAPE_ELLIPSE, CV_SHAPE_RECT,
};
use crate::types::Point;

/// Predefined structuring element shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    #[default]
    Rect,
    Cross,
    Ellipse,
}

impl Shape {
    pub fn raw(self) -> c_int {
        match self {
            Shape::Rect => CV_SHAPE_RECT,
            Shape::Cross => CV_SHAPE_CROSS,
            Shape::Ellipse => CV_SHAPE_ELLIPSE,
        }
    }
}

/// `cvMorphologyEx` operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorphOp {
    Erode,
    Dilate,
    /// Erode then dilate
    Open,
    /// Dilate then erode
    Close,
    /// Dilation minus erosion
    Gradient,
    /// Source minus opening
    TopHat,
    /// Closing minus source
    BlackHat,
}

impl MorphOp {
    pub fn raw(self) -> c_int {
        match self {
            MorphOp::Erode => CV_MOP_ERODE,
            MorphOp::Dilate => CV_MOP_DILATE,
            MorphOp::Open => CV_MOP_OPEN,
            MorphOp::Close => CV_MOP_CLOSE,
            MorphOp::Gradient => CV_MOP_GRADIENT,
            MorphOp::TopHat => CV_MOP_TOPHAT,
            MorphOp::BlackHat => CV_MOP_BLACKHAT,
        }
    }

    /// Gradient, top-hat and black-hat need a scratch image
    pub fn needs_temp(self) -> bool {
        matches!(self, MorphOp::Gradient | MorphOp::TopHat | MorphOp::BlackHat)
    }
}

/// An owned structuring element (`IplConvKernel`).
#[derive(Debug)]
pub struct StructuringElement {
    handle: Handle<KernelKind>,
}

impl StructuringElement {
    /// `cvCreateStructuringElementEx` with a predefined shape
    pub fn new(bridge: &Bridge, cols: i32, rows: i32, anchor: Point, shape: Shape) -> Result<Self> {
        Self::create(bridge, cols, rows, anchor, shape.raw(), None)
    }

    /// A custom element; `values` holds `cols * rows` cells in row order,
    /// non-zero cells belong to the element
    pub fn custom(bridge: &Bridge, cols: i32, rows: i32, anchor: Point, values: &[i32]) -> Result<Self> {
        let cells = cols.max(0) as usize * rows.max(0) as usize;
        if values.len() != cells {
            return Err(Error::InvalidArgument(format!(
                "{cols}x{rows} element needs {cells} values, got {}",
                values.len()
            )));
        }
        Self::create(bridge, cols, rows, anchor, CV_SHAPE_CUSTOM, Some(values.to_vec()))
    }

    fn create(
        bridge: &Bridge,
        cols: i32,
        rows: i32,
        anchor: Point,
        shape: c_int,
        values: Option<Vec<c_int>>,
    ) -> Result<Self> {
        let handle = bridge.create::<KernelKind, _>("cvCreateStructuringElementEx", move |api| unsafe {
            let mut values = values;
            let cells = values
                .as_mut()
                .map_or(std::ptr::null_mut(), |v| v.as_mut_ptr());
            api.create_structuring_element_ex(cols, rows, anchor.x, anchor.y, shape, cells)
        })?;
        Ok(Self { handle })
    }

    pub fn handle(&self) -> &Handle<KernelKind> {
        &self.handle
    }

    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

fn element_ptr(element: Option<&StructuringElement>) -> NativePtr<IplConvKernel> {
    element.map_or(NativePtr::null(), |e| e.handle.as_raw())
}

/// `cvDilate`; `None` selects a 3x3 rectangle
pub fn dilate(
    src: &impl Arr,
    dst: &mut impl Arr,
    element: Option<&StructuringElement>,
    iterations: i32,
) -> Result<()> {
    let (src, dst_ptr, element) = (src.arr_ptr(), dst.arr_ptr(), element_ptr(element));
    dst.bridge().run("cvDilate", move |api| unsafe {
        api.dilate(src.as_ptr(), dst_ptr.as_ptr(), element.as_ptr(), iterations)
    })
}

/// `cvErode`; `None` selects a 3x3 rectangle
pub fn erode(
    src: &impl Arr,
    dst: &mut impl Arr,
    element: Option<&StructuringElement>,
    iterations: i32,
) -> Result<()> {
    let (src, dst_ptr, element) = (src.arr_ptr(), dst.arr_ptr(), element_ptr(element));
    dst.bridge().run("cvErode", move |api| unsafe {
        api.erode(src.as_ptr(), dst_ptr.as_ptr(), element.as_ptr(), iterations)
    })
}

/// `cvMorphologyEx`. `temp` must be given, sized like `src`, when
/// [`MorphOp::needs_temp`] holds, or when such an operation runs in place.
pub fn morphology_ex(
    src: &impl Arr,
    dst: &mut impl Arr,
    temp: Option<&mut Image>,
    element: Option<&StructuringElement>,
    operation: MorphOp,
    iterations: i32,
) -> Result<()> {
    let temp = temp.map_or(NativePtr::null(), |t| t.arr_ptr());
    let (src, dst_ptr, element) = (src.arr_ptr(), dst.arr_ptr(), element_ptr(element));
    let operation = operation.raw();
    dst.bridge().run("cvMorphologyEx", move |api| unsafe {
        api.morphology_ex(
            src.as_ptr(),
            dst_ptr.as_ptr(),
            temp.as_ptr(),
            element.as_ptr(),
            operation,
            iterations,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values() {
        assert_eq!(Shape::Ellipse.raw(), 2);
        assert_eq!(MorphOp::Open.raw(), 2);
        assert_eq!(MorphOp::BlackHat.raw(), 6);
        assert!(MorphOp::TopHat.needs_temp());
        assert!(!MorphOp::Close.needs_temp());
    }
}
