//! Contour extraction and shape descriptors
//!
//! Contours come back as pool-owned [`Seq`]s in the caller's
//! [`MemStorage`]; walk siblings with [`Seq::next`].

use std::mem::size_of;
use std::os::raw::{c_int, c_void};
use std::ptr;

use cvbridge_ffi_common::{to_c_bool, NativePtr};

use crate::arr::Arr;
use crate::error::{Error, Result};
use crate::handle::{Handle, Ownership, SeqKind};
use crate::storage::{MemStorage, Seq};
use crate::sys::{
    CvContour, CvSeq, CvSlice, CV_CHAIN_APPROX_NONE, CV_CHAIN_APPROX_SIMPLE,
    CV_CHAIN_APPROX_TC89_KCOS, CV_CHAIN_APPROX_TC89_L1, CV_CHAIN_CODE, CV_LINK_RUNS,
    CV_POLY_APPROX_DP, CV_RETR_CCOMP, CV_RETR_EXTERNAL, CV_RETR_LIST, CV_RETR_TREE,
};
use crate::types::{Point, Slice};

const CONTOUR_HEADER: c_int = size_of::<CvContour>() as c_int;

/// Which contours `find_contours` returns and how they are linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RetrievalMode {
    /// Outermost contours only
    External,
    /// All contours, flat list
    #[default]
    List,
    /// Two levels: outer boundaries and holes
    CComp,
    /// Full nesting hierarchy
    Tree,
}

impl RetrievalMode {
    pub fn raw(self) -> c_int {
        match self {
            RetrievalMode::External => CV_RETR_EXTERNAL,
            RetrievalMode::List => CV_RETR_LIST,
            RetrievalMode::CComp => CV_RETR_CCOMP,
            RetrievalMode::Tree => CV_RETR_TREE,
        }
    }
}

/// Contour point encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainApprox {
    /// Freeman chain code
    Code,
    /// Every boundary point
    None,
    /// End points of straight runs
    #[default]
    Simple,
    TehChinL1,
    TehChinKcos,
    /// Link horizontal runs (list mode only)
    LinkRuns,
}

impl ChainApprox {
    pub fn raw(self) -> c_int {
        match self {
            ChainApprox::Code => CV_CHAIN_CODE,
            ChainApprox::None => CV_CHAIN_APPROX_NONE,
            ChainApprox::Simple => CV_CHAIN_APPROX_SIMPLE,
            ChainApprox::TehChinL1 => CV_CHAIN_APPROX_TC89_L1,
            ChainApprox::TehChinKcos => CV_CHAIN_APPROX_TC89_KCOS,
            ChainApprox::LinkRuns => CV_LINK_RUNS,
        }
    }
}

/// Polygon approximation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolyApprox {
    /// Douglas-Peucker
    #[default]
    DouglasPeucker,
}

impl PolyApprox {
    pub fn raw(self) -> c_int {
        match self {
            PolyApprox::DouglasPeucker => CV_POLY_APPROX_DP,
        }
    }
}

/// `cvFindContours` on a binary 8-bit image.
///
/// The image is modified. Returns the first top-level contour, or `None`
/// when the image has no contours.
pub fn find_contours<'s>(
    image: &mut impl Arr,
    storage: &'s MemStorage,
    mode: RetrievalMode,
    method: ChainApprox,
    offset: Point,
) -> Result<Option<Seq<'s>>> {
    const OPERATION: &str = "cvFindContours";
    let (img, pool) = (image.arr_ptr(), storage.handle().as_raw());
    let (mode, method) = (mode.raw(), method.raw());

    let (count, first) = storage.bridge().run(OPERATION, move |api| unsafe {
        let mut first: *mut CvSeq = ptr::null_mut();
        let count = api.find_contours(
            img.as_ptr(),
            pool.as_ptr(),
            &mut first,
            CONTOUR_HEADER,
            mode,
            method,
            offset.into(),
        );
        (count, NativePtr::new(first))
    })?;

    if count < 0 {
        return Err(Error::OperationFailed {
            operation: OPERATION,
            code: count,
            message: "contour retrieval failed".into(),
        });
    }
    Ok((!first.is_null()).then(|| {
        Seq::from_handle(Handle::<SeqKind>::new(
            storage.bridge().clone(),
            first,
            Ownership::Pooled,
        ))
    }))
}

/// `cvApproxPoly`: a polygon within `eps` of `contour`, stored in `storage`.
///
/// With `recursive`, the contour's siblings and children are approximated
/// too.
pub fn approx_poly<'s>(
    contour: &Seq<'_>,
    storage: &'s MemStorage,
    method: PolyApprox,
    eps: f64,
    recursive: bool,
) -> Result<Seq<'s>> {
    let src = contour.arr_ptr();
    let (method, recursive) = (method.raw(), to_c_bool(recursive));
    let handle = storage.bridge().from_pool::<SeqKind, _>(
        storage.handle(),
        "cvApproxPoly",
        move |api, pool| unsafe {
            api.approx_poly(
                src.as_ptr() as *const c_void,
                CONTOUR_HEADER,
                pool,
                method,
                eps,
                recursive,
            )
        },
    )?;
    Ok(Seq::from_handle(handle))
}

/// `cvContourArea` over `slice`; `oriented` keeps the sign
/// (negative for clockwise contours)
pub fn contour_area(contour: &impl Arr, slice: Slice, oriented: bool) -> Result<f64> {
    let (src, slice): (_, CvSlice) = (contour.arr_ptr(), slice.into());
    let oriented = to_c_bool(oriented);
    contour.bridge().run("cvContourArea", move |api| unsafe {
        api.contour_area(src.as_ptr(), slice, oriented)
    })
}

/// `cvArcLength`. `is_closed: None` takes closure from the sequence flags.
pub fn arc_length(curve: &impl Arr, slice: Slice, is_closed: Option<bool>) -> Result<f64> {
    let (src, slice): (_, CvSlice) = (curve.arr_ptr(), slice.into());
    let closed = is_closed.map_or(-1, to_c_bool);
    curve.bridge().run("cvArcLength", move |api| unsafe {
        api.arc_length(src.as_ptr() as *const c_void, slice, closed)
    })
}

/// Length of the whole closed contour
pub fn contour_perimeter(contour: &impl Arr) -> Result<f64> {
    arc_length(contour, Slice::WHOLE, Some(true))
}

/// `cvCheckContourConvexity`
pub fn check_contour_convexity(contour: &impl Arr) -> Result<bool> {
    let src = contour.arr_ptr();
    let convex = contour.bridge().run("cvCheckContourConvexity", move |api| unsafe {
        api.check_contour_convexity(src.as_ptr())
    })?;
    Ok(convex > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values() {
        assert_eq!(RetrievalMode::Tree.raw(), 3);
        assert_eq!(ChainApprox::default().raw(), 2);
        assert_eq!(ChainApprox::LinkRuns.raw(), 5);
        assert_eq!(PolyApprox::default().raw(), 0);
    }
}
