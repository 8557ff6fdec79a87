//! Integer constant catalogues with the exact values of the native headers

use std::os::raw::c_int;

// Image depths (`IPL_DEPTH_*`)
pub const IPL_DEPTH_SIGN: c_int = 0x8000_0000_u32 as c_int;
pub const IPL_DEPTH_1U: c_int = 1;
pub const IPL_DEPTH_8U: c_int = 8;
pub const IPL_DEPTH_16U: c_int = 16;
pub const IPL_DEPTH_32F: c_int = 32;
pub const IPL_DEPTH_64F: c_int = 64;
pub const IPL_DEPTH_8S: c_int = IPL_DEPTH_SIGN | 8;
pub const IPL_DEPTH_16S: c_int = IPL_DEPTH_SIGN | 16;
pub const IPL_DEPTH_32S: c_int = IPL_DEPTH_SIGN | 32;

pub const IPL_DATA_ORDER_PIXEL: c_int = 0;
pub const IPL_ORIGIN_TL: c_int = 0;
pub const IPL_ALIGN_4BYTES: c_int = 4;

// Memory storage and sequences
pub const CV_STORAGE_MAGIC_VAL: c_int = 0x4289_0000;
pub const CV_SEQ_MAGIC_VAL: c_int = 0x4299_0000;
pub const CV_MAGIC_MASK: c_int = 0xFFFF_0000_u32 as c_int;
/// Default `cvCreateMemStorage` block size (64K minus allocator overhead)
pub const CV_STORAGE_BLOCK_SIZE: c_int = (1 << 16) - 128;
pub const CV_WHOLE_SEQ_END_INDEX: c_int = 0x3fff_ffff;

/// `CV_32SC2`, the element type of point sequences
pub const CV_SEQ_ELTYPE_POINT: c_int = 12;
pub const CV_SEQ_KIND_CURVE: c_int = 1 << 12;
pub const CV_SEQ_FLAG_CLOSED: c_int = 1 << 14;
pub const CV_SEQ_POLYGON: c_int = CV_SEQ_KIND_CURVE | CV_SEQ_FLAG_CLOSED | CV_SEQ_ELTYPE_POINT;

// Error status codes (`CV_Sts*`)
pub const CV_STS_OK: c_int = 0;
pub const CV_STS_ERROR: c_int = -2;
pub const CV_STS_NO_MEM: c_int = -4;
pub const CV_STS_BAD_ARG: c_int = -5;
pub const CV_STS_NULL_PTR: c_int = -27;
pub const CV_STS_BAD_SIZE: c_int = -201;
pub const CV_STS_OBJECT_NOT_FOUND: c_int = -204;
pub const CV_STS_UNMATCHED_FORMATS: c_int = -205;
pub const CV_STS_UNMATCHED_SIZES: c_int = -209;
pub const CV_STS_UNSUPPORTED_FORMAT: c_int = -210;
pub const CV_STS_OUT_OF_RANGE: c_int = -211;
pub const CV_STS_NOT_IMPLEMENTED: c_int = -213;

// Error modes (`cvSetErrMode`)
pub const CV_ERR_MODE_LEAF: c_int = 0;
pub const CV_ERR_MODE_PARENT: c_int = 1;
pub const CV_ERR_MODE_SILENT: c_int = 2;

// Colour conversion codes
pub const CV_BGR2GRAY: c_int = 6;
pub const CV_RGB2GRAY: c_int = 7;
pub const CV_GRAY2BGR: c_int = 8;
pub const CV_BGR2XYZ: c_int = 32;
pub const CV_RGB2XYZ: c_int = 33;
pub const CV_XYZ2BGR: c_int = 34;
pub const CV_XYZ2RGB: c_int = 35;
pub const CV_BGR2YCRCB: c_int = 36;
pub const CV_RGB2YCRCB: c_int = 37;
pub const CV_YCRCB2BGR: c_int = 38;
pub const CV_YCRCB2RGB: c_int = 39;
pub const CV_BGR2HSV: c_int = 40;
pub const CV_RGB2HSV: c_int = 41;
pub const CV_BGR2LAB: c_int = 44;
pub const CV_RGB2LAB: c_int = 45;
pub const CV_BAYER_BG2BGR: c_int = 46;
pub const CV_BAYER_GB2BGR: c_int = 47;
pub const CV_BAYER_RG2BGR: c_int = 48;
pub const CV_BAYER_GR2BGR: c_int = 49;
pub const CV_BAYER_BG2RGB: c_int = CV_BAYER_RG2BGR;
pub const CV_BAYER_GB2RGB: c_int = CV_BAYER_GR2BGR;
pub const CV_BAYER_RG2RGB: c_int = CV_BAYER_BG2BGR;
pub const CV_BAYER_GR2RGB: c_int = CV_BAYER_GB2BGR;
pub const CV_BGR2LUV: c_int = 50;
pub const CV_RGB2LUV: c_int = 51;
pub const CV_BGR2HLS: c_int = 52;
pub const CV_RGB2HLS: c_int = 53;
pub const CV_HSV2BGR: c_int = 54;
pub const CV_HSV2RGB: c_int = 55;
pub const CV_LAB2BGR: c_int = 56;
pub const CV_LAB2RGB: c_int = 57;
pub const CV_LUV2BGR: c_int = 58;
pub const CV_LUV2RGB: c_int = 59;
pub const CV_HLS2BGR: c_int = 60;
pub const CV_HLS2RGB: c_int = 61;

// Threshold types
pub const CV_THRESH_BINARY: c_int = 0;
pub const CV_THRESH_BINARY_INV: c_int = 1;
pub const CV_THRESH_TRUNC: c_int = 2;
pub const CV_THRESH_TOZERO: c_int = 3;
pub const CV_THRESH_TOZERO_INV: c_int = 4;
pub const CV_THRESH_MASK: c_int = 7;
pub const CV_THRESH_OTSU: c_int = 8;

// Pyramid filters
pub const CV_GAUSSIAN_5X5: c_int = 7;

// Structuring element shapes
pub const CV_SHAPE_RECT: c_int = 0;
pub const CV_SHAPE_CROSS: c_int = 1;
pub const CV_SHAPE_ELLIPSE: c_int = 2;
pub const CV_SHAPE_CUSTOM: c_int = 100;

// Morphology operations
pub const CV_MOP_ERODE: c_int = 0;
pub const CV_MOP_DILATE: c_int = 1;
pub const CV_MOP_OPEN: c_int = 2;
pub const CV_MOP_CLOSE: c_int = 3;
pub const CV_MOP_GRADIENT: c_int = 4;
pub const CV_MOP_TOPHAT: c_int = 5;
pub const CV_MOP_BLACKHAT: c_int = 6;

// Contour retrieval modes
pub const CV_RETR_EXTERNAL: c_int = 0;
pub const CV_RETR_LIST: c_int = 1;
pub const CV_RETR_CCOMP: c_int = 2;
pub const CV_RETR_TREE: c_int = 3;

// Contour approximation methods
pub const CV_CHAIN_CODE: c_int = 0;
pub const CV_CHAIN_APPROX_NONE: c_int = 1;
pub const CV_CHAIN_APPROX_SIMPLE: c_int = 2;
pub const CV_CHAIN_APPROX_TC89_L1: c_int = 3;
pub const CV_CHAIN_APPROX_TC89_KCOS: c_int = 4;
pub const CV_LINK_RUNS: c_int = 5;

// Polygon approximation
pub const CV_POLY_APPROX_DP: c_int = 0;

// Line types
pub const CV_LINE_4: c_int = 4;
pub const CV_LINE_8: c_int = 8;
pub const CV_AA: c_int = 16;
/// Thickness value that fills closed shapes
pub const CV_FILLED: c_int = -1;

// highgui
pub const CV_WINDOW_NORMAL: c_int = 0;
pub const CV_WINDOW_AUTOSIZE: c_int = 1;
pub const CV_LOAD_IMAGE_UNCHANGED: c_int = -1;
pub const CV_LOAD_IMAGE_GRAYSCALE: c_int = 0;
pub const CV_LOAD_IMAGE_COLOR: c_int = 1;
