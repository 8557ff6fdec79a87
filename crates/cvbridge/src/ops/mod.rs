//! Pass-through image operations
//!
//! Each function forwards to one native entry point through the bridge.
//! Sources are taken by shared reference and destinations by mutable
//! reference; the native library checks sizes and formats and reports
//! mismatches as [`Error::OperationFailed`](crate::Error::OperationFailed).

pub mod arith;
pub mod color;
pub mod contour;
pub mod draw;
pub mod morphology;
pub mod pyramid;
pub mod threshold;

pub use arith::{and, convert_scale, copy, or, split};
pub use color::{cvt_color, ColorConversion};
pub use contour::{
    approx_poly, arc_length, check_contour_convexity, contour_area, contour_perimeter,
    find_contours, ChainApprox, PolyApprox, RetrievalMode,
};
pub use draw::{circle, line, poly_line, rectangle, LineType, FILLED};
pub use morphology::{dilate, erode, morphology_ex, MorphOp, Shape, StructuringElement};
pub use pyramid::{pyr_down, pyr_up, PyramidFilter};
pub use threshold::{threshold, threshold_otsu, ThresholdType};
