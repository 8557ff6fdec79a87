//! C-compatible records mirroring the native headers
//!
//! Every record here is a bit-exact copy of its C counterpart: field order,
//! field types and padding must match `cxtypes.h` / `cxcore.h` for the
//! targeted OpenCV 2.x release. Reordering a field or substituting a type
//! (for example `i64` for `int`) is a memory-safety bug, not a style choice.
//! The offset tests at the bottom of this file pin the 64-bit layouts.

use std::os::raw::{c_char, c_int, c_schar, c_void};

/// Opaque array argument (`CvArr*` accepts images, matrices and sequences)
pub type CvArr = c_void;

/// Opaque capture source (`CvCapture`)
#[repr(C)]
pub struct CvCapture {
    _private: [u8; 0],
}

/// `CvPoint`: 2D integer point
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvPoint {
    pub x: c_int,
    pub y: c_int,
}

/// `CvPoint2D32f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvPoint2D32f {
    pub x: f32,
    pub y: f32,
}

/// `CvPoint3D32f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvPoint3D32f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// `CvPoint2D64f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvPoint2D64f {
    pub x: f64,
    pub y: f64,
}

/// `CvPoint3D64f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvPoint3D64f {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// `CvSize`: 2D integer size
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvSize {
    pub width: c_int,
    pub height: c_int,
}

/// `CvSize2D32f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvSize2D32f {
    pub width: f32,
    pub height: f32,
}

/// `CvRect`: integer rectangle, top-left corner plus size
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvRect {
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
}

/// `CvScalar`: four doubles, used for colours and per-channel values
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvScalar {
    pub val: [f64; 4],
}

/// `CvSlice`: half-open index range into a sequence
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvSlice {
    pub start_index: c_int,
    pub end_index: c_int,
}

/// `IplROI`: region of interest attached to an image header
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IplROI {
    /// Channel of interest, 0 for all channels
    pub coi: c_int,
    pub x_offset: c_int,
    pub y_offset: c_int,
    pub width: c_int,
    pub height: c_int,
}

/// `IplTileInfo` is never dereferenced by the bridge
#[repr(C)]
pub struct IplTileInfo {
    _private: [u8; 0],
}

/// `IplImage`: image header
#[repr(C)]
#[derive(Debug)]
pub struct IplImage {
    /// `sizeof(IplImage)`
    pub n_size: c_int,
    /// Version, always 0
    pub id: c_int,
    /// Number of channels, 1 to 4
    pub n_channels: c_int,
    /// Ignored by OpenCV
    pub alpha_channel: c_int,
    /// Pixel depth in bits, `IPL_DEPTH_*`
    pub depth: c_int,
    pub color_model: [c_char; 4],
    pub channel_seq: [c_char; 4],
    /// 0 interleaved, 1 separate planes
    pub data_order: c_int,
    /// 0 top-left origin, 1 bottom-left
    pub origin: c_int,
    /// Row alignment, 4 or 8
    pub align: c_int,
    pub width: c_int,
    pub height: c_int,
    pub roi: *mut IplROI,
    pub mask_roi: *mut IplImage,
    pub image_id: *mut c_void,
    pub tile_info: *mut IplTileInfo,
    /// Bytes of pixel data (`height * width_step` for interleaved data)
    pub image_size: c_int,
    pub image_data: *mut c_char,
    /// Bytes per row including padding
    pub width_step: c_int,
    pub border_mode: [c_int; 4],
    pub border_const: [c_int; 4],
    /// Start of the allocation, used when releasing the pixel data
    pub image_data_origin: *mut c_char,
}

/// `IplConvKernel`: structuring element for morphology
#[repr(C)]
#[derive(Debug)]
pub struct IplConvKernel {
    pub n_cols: c_int,
    pub n_rows: c_int,
    pub anchor_x: c_int,
    pub anchor_y: c_int,
    pub values: *mut c_int,
    pub n_shift_r: c_int,
}

/// `CvMemBlock`: link in a memory storage's block list
#[repr(C)]
#[derive(Debug)]
pub struct CvMemBlock {
    pub prev: *mut CvMemBlock,
    pub next: *mut CvMemBlock,
}

/// `CvMemStorage`: bump allocator owning sequences and their elements
#[repr(C)]
#[derive(Debug)]
pub struct CvMemStorage {
    pub signature: c_int,
    /// First allocated block
    pub bottom: *mut CvMemBlock,
    /// Current block
    pub top: *mut CvMemBlock,
    /// Storage borrowed from, if any
    pub parent: *mut CvMemStorage,
    pub block_size: c_int,
    /// Remaining bytes in the current block
    pub free_space: c_int,
}

/// `CvSeqBlock`: one contiguous run of sequence elements
#[repr(C)]
#[derive(Debug)]
pub struct CvSeqBlock {
    pub prev: *mut CvSeqBlock,
    pub next: *mut CvSeqBlock,
    pub start_index: c_int,
    pub count: c_int,
    pub data: *mut c_schar,
}

/// `CvSeq`: growable sequence header (`CV_SEQUENCE_FIELDS`)
#[repr(C)]
#[derive(Debug)]
pub struct CvSeq {
    /// Magic value plus element type and kind flags
    pub flags: c_int,
    /// Size of the header, at least `sizeof(CvSeq)`
    pub header_size: c_int,
    /// Previous sequence at the same level
    pub h_prev: *mut CvSeq,
    /// Next sequence at the same level
    pub h_next: *mut CvSeq,
    /// Parent (or previous) sequence in a tree
    pub v_prev: *mut CvSeq,
    /// First child (or next) sequence in a tree
    pub v_next: *mut CvSeq,
    /// Number of elements
    pub total: c_int,
    pub elem_size: c_int,
    pub block_max: *mut c_schar,
    pub ptr: *mut c_schar,
    pub delta_elems: c_int,
    pub storage: *mut CvMemStorage,
    pub free_blocks: *mut CvSeqBlock,
    pub first: *mut CvSeqBlock,
}

/// `CvContour`: sequence header produced by contour functions
#[repr(C)]
#[derive(Debug)]
pub struct CvContour {
    pub seq: CvSeq,
    pub rect: CvRect,
    pub color: c_int,
    pub reserved: [c_int; 3],
}

#[cfg(all(test, target_pointer_width = "64"))]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_small_record_sizes() {
        assert_eq!(size_of::<CvPoint>(), 8);
        assert_eq!(size_of::<CvPoint3D32f>(), 12);
        assert_eq!(size_of::<CvPoint3D64f>(), 24);
        assert_eq!(size_of::<CvSize>(), 8);
        assert_eq!(size_of::<CvRect>(), 16);
        assert_eq!(size_of::<CvScalar>(), 32);
        assert_eq!(size_of::<CvSlice>(), 8);
        assert_eq!(size_of::<IplROI>(), 20);
    }

    #[test]
    fn test_ipl_image_layout() {
        assert_eq!(offset_of!(IplImage, depth), 16);
        assert_eq!(offset_of!(IplImage, color_model), 20);
        assert_eq!(offset_of!(IplImage, channel_seq), 24);
        assert_eq!(offset_of!(IplImage, data_order), 28);
        assert_eq!(offset_of!(IplImage, width), 40);
        assert_eq!(offset_of!(IplImage, height), 44);
        assert_eq!(offset_of!(IplImage, roi), 48);
        assert_eq!(offset_of!(IplImage, tile_info), 72);
        assert_eq!(offset_of!(IplImage, image_size), 80);
        assert_eq!(offset_of!(IplImage, image_data), 88);
        assert_eq!(offset_of!(IplImage, width_step), 96);
        assert_eq!(offset_of!(IplImage, border_mode), 100);
        assert_eq!(offset_of!(IplImage, border_const), 116);
        assert_eq!(offset_of!(IplImage, image_data_origin), 136);
        assert_eq!(size_of::<IplImage>(), 144);
    }

    #[test]
    fn test_seq_layout() {
        assert_eq!(offset_of!(CvSeq, h_prev), 8);
        assert_eq!(offset_of!(CvSeq, v_next), 32);
        assert_eq!(offset_of!(CvSeq, total), 40);
        assert_eq!(offset_of!(CvSeq, elem_size), 44);
        assert_eq!(offset_of!(CvSeq, delta_elems), 64);
        assert_eq!(offset_of!(CvSeq, storage), 72);
        assert_eq!(offset_of!(CvSeq, first), 88);
        assert_eq!(size_of::<CvSeq>(), 96);

        assert_eq!(offset_of!(CvContour, rect), 96);
        assert_eq!(offset_of!(CvContour, color), 112);
        assert_eq!(size_of::<CvContour>(), 128);
    }

    #[test]
    fn test_storage_and_kernel_layout() {
        assert_eq!(offset_of!(CvMemStorage, bottom), 8);
        assert_eq!(offset_of!(CvMemStorage, block_size), 32);
        assert_eq!(offset_of!(CvMemStorage, free_space), 36);
        assert_eq!(size_of::<CvMemStorage>(), 40);

        assert_eq!(offset_of!(CvSeqBlock, start_index), 16);
        assert_eq!(offset_of!(CvSeqBlock, data), 24);
        assert_eq!(size_of::<CvSeqBlock>(), 32);

        assert_eq!(offset_of!(IplConvKernel, values), 16);
        assert_eq!(offset_of!(IplConvKernel, n_shift_r), 24);
        assert_eq!(size_of::<IplConvKernel>(), 32);
    }
}
