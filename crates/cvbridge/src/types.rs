//! Plain value types mirrored onto the native records.

use serde::{Deserialize, Serialize};

use crate::sys::{
    CvPoint, CvPoint2D32f, CvPoint2D64f, CvPoint3D32f, CvPoint3D64f, CvRect, CvScalar, CvSize,
    CvSize2D32f, CvSlice, CV_WHOLE_SEQ_END_INDEX,
};

/// 2D integer point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for CvPoint {
    fn from(p: Point) -> Self {
        CvPoint { x: p.x, y: p.y }
    }
}

impl From<CvPoint> for Point {
    fn from(p: CvPoint) -> Self {
        Point { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D32f {
    pub x: f32,
    pub y: f32,
}

impl From<Point2D32f> for CvPoint2D32f {
    fn from(p: Point2D32f) -> Self {
        CvPoint2D32f { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D32f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Point3D32f> for CvPoint3D32f {
    fn from(p: Point3D32f) -> Self {
        CvPoint3D32f {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D64f {
    pub x: f64,
    pub y: f64,
}

impl From<Point2D64f> for CvPoint2D64f {
    fn from(p: Point2D64f) -> Self {
        CvPoint2D64f { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D64f {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Point3D64f> for CvPoint3D64f {
    fn from(p: Point3D64f) -> Self {
        CvPoint3D64f {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

/// 2D integer size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Half of each dimension, rounded up (the output of a pyramid step down)
    pub const fn halved(self) -> Self {
        Self {
            width: (self.width + 1) / 2,
            height: (self.height + 1) / 2,
        }
    }

    /// Twice each dimension (the output of a pyramid step up)
    pub const fn doubled(self) -> Self {
        Self {
            width: self.width * 2,
            height: self.height * 2,
        }
    }
}

impl From<Size> for CvSize {
    fn from(s: Size) -> Self {
        CvSize {
            width: s.width,
            height: s.height,
        }
    }
}

impl From<CvSize> for Size {
    fn from(s: CvSize) -> Self {
        Size {
            width: s.width,
            height: s.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size2D32f {
    pub width: f32,
    pub height: f32,
}

impl From<Size2D32f> for CvSize2D32f {
    fn from(s: Size2D32f) -> Self {
        CvSize2D32f {
            width: s.width,
            height: s.height,
        }
    }
}

/// Integer rectangle: top-left corner plus size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl From<Rect> for CvRect {
    fn from(r: Rect) -> Self {
        CvRect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

impl From<CvRect> for Rect {
    fn from(r: CvRect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

/// Up to four channel values; colours are given in BGR(A) order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scalar(pub [f64; 4]);

impl Scalar {
    pub const fn all(v: f64) -> Self {
        Self([v; 4])
    }

    /// A colour from RGB components, stored in native BGR order
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self([b, g, r, 0.0])
    }
}

impl From<Scalar> for CvScalar {
    fn from(s: Scalar) -> Self {
        CvScalar { val: s.0 }
    }
}

/// Half-open range of sequence indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub start: i32,
    pub end: i32,
}

impl Slice {
    /// Every element of a sequence
    pub const WHOLE: Slice = Slice {
        start: 0,
        end: CV_WHOLE_SEQ_END_INDEX,
    };

    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self::WHOLE
    }
}

impl From<Slice> for CvSlice {
    fn from(s: Slice) -> Self {
        CvSlice {
            start_index: s.start,
            end_index: s.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_rgb_is_stored_bgr() {
        let c: CvScalar = Scalar::rgb(255.0, 128.0, 0.0).into();
        assert_eq!(c.val, [0.0, 128.0, 255.0, 0.0]);
    }

    #[test]
    fn test_whole_slice() {
        let s: CvSlice = Slice::default().into();
        assert_eq!(s.start_index, 0);
        assert_eq!(s.end_index, CV_WHOLE_SEQ_END_INDEX);
    }

    #[test]
    fn test_pyramid_sizes() {
        assert_eq!(Size::new(5, 4).halved(), Size::new(3, 2));
        assert_eq!(Size::new(3, 2).doubled(), Size::new(6, 4));
    }

    #[test]
    fn test_rect_round_trip_through_native() {
        let r = Rect::new(1, 2, 3, 4);
        assert_eq!(Rect::from(CvRect::from(r)), r);
        assert_eq!(r.size(), Size::new(3, 4));
    }
}
