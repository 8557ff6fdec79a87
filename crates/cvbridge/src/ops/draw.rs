//! Drawing primitives. Colours are [`Scalar`]s in the image's channel order.

use std::os::raw::c_int;

use cvbridge_ffi_common::{array_table, to_c_bool};

use crate::arr::Arr;
use crate::error::{Error, Result};
use crate::sys::{CvPoint, CvScalar, CV_AA, CV_FILLED, CV_LINE_4, CV_LINE_8};
use crate::types::{Point, Scalar};

/// Thickness that fills closed shapes
pub const FILLED: i32 = CV_FILLED;

/// Line rasterisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineType {
    /// 4-connected
    Four,
    /// 8-connected
    #[default]
    Eight,
    /// Anti-aliased
    AntiAliased,
}

impl LineType {
    pub fn raw(self) -> c_int {
        match self {
            LineType::Four => CV_LINE_4,
            LineType::Eight => CV_LINE_8,
            LineType::AntiAliased => CV_AA,
        }
    }
}

/// `cvPolyLine`: draw one or more polylines.
///
/// `shift` is the number of fractional bits in the coordinates.
pub fn poly_line(
    img: &mut impl Arr,
    polylines: &[Vec<Point>],
    is_closed: bool,
    color: Scalar,
    thickness: i32,
    line_type: LineType,
    shift: i32,
) -> Result<()> {
    let contours = c_int::try_from(polylines.len())
        .map_err(|_| Error::InvalidArgument("too many polylines".into()))?;
    let mut points: Vec<Vec<CvPoint>> = polylines
        .iter()
        .map(|line| line.iter().copied().map(CvPoint::from).collect())
        .collect();
    let (dst, color): (_, CvScalar) = (img.arr_ptr(), color.into());
    let (closed, line_type) = (to_c_bool(is_closed), line_type.raw());

    img.bridge().run("cvPolyLine", move |api| unsafe {
        let (mut table, lengths) = array_table(&mut points);
        api.poly_line(
            dst.as_ptr(),
            table.as_mut_ptr(),
            lengths.as_ptr(),
            contours,
            closed,
            color,
            thickness,
            line_type,
            shift,
        )
    })
}

/// `cvLine`
pub fn line(
    img: &mut impl Arr,
    pt1: Point,
    pt2: Point,
    color: Scalar,
    thickness: i32,
    line_type: LineType,
    shift: i32,
) -> Result<()> {
    let (dst, color): (_, CvScalar) = (img.arr_ptr(), color.into());
    let line_type = line_type.raw();
    img.bridge().run("cvLine", move |api| unsafe {
        api.line(dst.as_ptr(), pt1.into(), pt2.into(), color, thickness, line_type, shift)
    })
}

/// `cvRectangle` between opposite corners; [`FILLED`] fills it
pub fn rectangle(
    img: &mut impl Arr,
    pt1: Point,
    pt2: Point,
    color: Scalar,
    thickness: i32,
    line_type: LineType,
    shift: i32,
) -> Result<()> {
    let (dst, color): (_, CvScalar) = (img.arr_ptr(), color.into());
    let line_type = line_type.raw();
    img.bridge().run("cvRectangle", move |api| unsafe {
        api.rectangle(dst.as_ptr(), pt1.into(), pt2.into(), color, thickness, line_type, shift)
    })
}

/// `cvCircle`; [`FILLED`] draws a disc
pub fn circle(
    img: &mut impl Arr,
    center: Point,
    radius: i32,
    color: Scalar,
    thickness: i32,
    line_type: LineType,
    shift: i32,
) -> Result<()> {
    if radius < 0 {
        return Err(Error::InvalidArgument(format!("negative radius {radius}")));
    }
    let (dst, color): (_, CvScalar) = (img.arr_ptr(), color.into());
    let line_type = line_type.raw();
    img.bridge().run("cvCircle", move |api| unsafe {
        api.circle(dst.as_ptr(), center.into(), radius, color, thickness, line_type, shift)
    })
}
