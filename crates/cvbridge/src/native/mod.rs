//! Native entry-point table
//!
//! [`NativeApi`] lists the C entry points the bridge calls, one method per
//! function, with the C signature kept as-is (raw pointers, `c_int` flags,
//! out-parameters for release). Two providers implement it:
//!
//! - [`opencv::OpenCv`] (feature `opencv`): links the system OpenCV 2.x
//!   libraries and forwards every call.
//! - [`software::SoftwareBackend`]: an in-process provider with identical
//!   record layouts, used for tests and headless runs.
//!
//! # Safety
//!
//! Every method must only be called on the executor's pinned thread, and
//! every pointer argument must satisfy the contract of the matching C
//! function. The bridge is the only caller.

#[cfg(feature = "opencv")]
pub mod opencv;
pub mod software;

use std::os::raw::{c_char, c_int, c_schar, c_void};

use crate::sys::{
    CvArr, CvCapture, CvMemStorage, CvPoint, CvRect, CvScalar, CvSeq, CvSize, CvSlice,
    IplConvKernel, IplImage,
};

#[cfg(feature = "opencv")]
pub use opencv::OpenCv;
pub use software::{ClipSpec, SoftwareBackend, SoftwareStats, WindowInfo};

/// The native library's C entry points.
#[allow(clippy::too_many_arguments)]
pub trait NativeApi: Send + Sync + 'static {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    // === Error status (cxcore) ===

    /// `cvGetErrStatus`
    unsafe fn get_err_status(&self) -> c_int;
    /// `cvSetErrStatus`
    unsafe fn set_err_status(&self, status: c_int);
    /// `cvSetErrMode`, returns the previous mode
    unsafe fn set_err_mode(&self, mode: c_int) -> c_int;
    /// `cvErrorStr`, a static description of a status code
    unsafe fn error_str(&self, status: c_int) -> *const c_char;

    // === Images (cxcore) ===

    /// `cvCreateImage`
    unsafe fn create_image(&self, size: CvSize, depth: c_int, channels: c_int) -> *mut IplImage;
    /// `cvCloneImage`
    unsafe fn clone_image(&self, image: *const IplImage) -> *mut IplImage;
    /// `cvReleaseImage`, nulls `*image`
    unsafe fn release_image(&self, image: *mut *mut IplImage);
    /// `cvGetSize`, honours the region of interest
    unsafe fn get_size(&self, arr: *const CvArr) -> CvSize;
    /// `cvSetImageCOI`
    unsafe fn set_image_coi(&self, image: *mut IplImage, coi: c_int);
    /// `cvSetImageROI`
    unsafe fn set_image_roi(&self, image: *mut IplImage, rect: CvRect);
    /// `cvResetImageROI`
    unsafe fn reset_image_roi(&self, image: *mut IplImage);

    // === Memory storage and sequences (cxcore) ===

    /// `cvCreateMemStorage`, zero selects the default block size
    unsafe fn create_mem_storage(&self, block_size: c_int) -> *mut CvMemStorage;
    /// `cvClearMemStorage`
    unsafe fn clear_mem_storage(&self, storage: *mut CvMemStorage);
    /// `cvReleaseMemStorage`, nulls `*storage`
    unsafe fn release_mem_storage(&self, storage: *mut *mut CvMemStorage);
    /// `cvCreateSeq`
    unsafe fn create_seq(
        &self,
        seq_flags: c_int,
        header_size: usize,
        elem_size: usize,
        storage: *mut CvMemStorage,
    ) -> *mut CvSeq;
    /// `cvSeqPush`, copies `element` (or zero-fills when null)
    unsafe fn seq_push(&self, seq: *mut CvSeq, element: *const c_void) -> *mut c_schar;
    /// `cvGetSeqElem`, negative indices count from the end
    unsafe fn get_seq_elem(&self, seq: *const CvSeq, index: c_int) -> *mut c_schar;

    // === Structuring elements (cv) ===

    /// `cvCreateStructuringElementEx`
    unsafe fn create_structuring_element_ex(
        &self,
        cols: c_int,
        rows: c_int,
        anchor_x: c_int,
        anchor_y: c_int,
        shape: c_int,
        values: *mut c_int,
    ) -> *mut IplConvKernel;
    /// `cvReleaseStructuringElement`, nulls `*element`
    unsafe fn release_structuring_element(&self, element: *mut *mut IplConvKernel);

    // === Capture, files and windows (highgui) ===

    /// `cvCreateCameraCapture` (`cvCaptureFromCAM`)
    unsafe fn create_camera_capture(&self, index: c_int) -> *mut CvCapture;
    /// `cvCreateFileCapture` (`cvCaptureFromFile`)
    unsafe fn create_file_capture(&self, filename: *const c_char) -> *mut CvCapture;
    /// `cvQueryFrame`: the returned image belongs to the capture
    unsafe fn query_frame(&self, capture: *mut CvCapture) -> *mut IplImage;
    /// `cvReleaseCapture`, nulls `*capture`
    unsafe fn release_capture(&self, capture: *mut *mut CvCapture);
    /// `cvLoadImage`
    unsafe fn load_image(&self, filename: *const c_char, iscolor: c_int) -> *mut IplImage;
    /// `cvSaveImage`, non-zero on success
    unsafe fn save_image(
        &self,
        filename: *const c_char,
        image: *const CvArr,
        params: *const c_int,
    ) -> c_int;
    /// `cvNamedWindow`
    unsafe fn named_window(&self, name: *const c_char, flags: c_int) -> c_int;
    /// `cvShowImage`
    unsafe fn show_image(&self, name: *const c_char, image: *const CvArr);
    /// `cvWaitKey`, -1 when no key was pressed
    unsafe fn wait_key(&self, delay: c_int) -> c_int;
    /// `cvDestroyWindow`
    unsafe fn destroy_window(&self, name: *const c_char);
    /// `cvDestroyAllWindows`
    unsafe fn destroy_all_windows(&self);

    // === Array arithmetic (cxcore) ===

    /// `cvCopy`
    unsafe fn copy(&self, src: *const CvArr, dst: *mut CvArr, mask: *const CvArr);
    /// `cvConvertScale`
    unsafe fn convert_scale(&self, src: *const CvArr, dst: *mut CvArr, scale: f64, shift: f64);
    /// `cvAnd`
    unsafe fn and(
        &self,
        src1: *const CvArr,
        src2: *const CvArr,
        dst: *mut CvArr,
        mask: *const CvArr,
    );
    /// `cvOr`
    unsafe fn or(&self, src1: *const CvArr, src2: *const CvArr, dst: *mut CvArr, mask: *const CvArr);
    /// `cvSplit`
    unsafe fn split(
        &self,
        src: *const CvArr,
        dst0: *mut CvArr,
        dst1: *mut CvArr,
        dst2: *mut CvArr,
        dst3: *mut CvArr,
    );

    // === Image processing (cv) ===

    /// `cvCvtColor`
    unsafe fn cvt_color(&self, src: *const CvArr, dst: *mut CvArr, code: c_int);
    /// `cvThreshold`, returns the threshold used (computed for Otsu)
    unsafe fn threshold(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        threshold: f64,
        max_value: f64,
        threshold_type: c_int,
    ) -> f64;
    /// `cvPyrDown`
    unsafe fn pyr_down(&self, src: *const CvArr, dst: *mut CvArr, filter: c_int);
    /// `cvPyrUp`
    unsafe fn pyr_up(&self, src: *const CvArr, dst: *mut CvArr, filter: c_int);
    /// `cvDilate`, null element selects a 3x3 rectangle
    unsafe fn dilate(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        element: *mut IplConvKernel,
        iterations: c_int,
    );
    /// `cvErode`, null element selects a 3x3 rectangle
    unsafe fn erode(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        element: *mut IplConvKernel,
        iterations: c_int,
    );
    /// `cvMorphologyEx`
    unsafe fn morphology_ex(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        temp: *mut CvArr,
        element: *mut IplConvKernel,
        operation: c_int,
        iterations: c_int,
    );

    // === Drawing (cxcore) ===

    /// `cvPolyLine`
    unsafe fn poly_line(
        &self,
        img: *mut CvArr,
        pts: *mut *mut CvPoint,
        npts: *const c_int,
        contours: c_int,
        is_closed: c_int,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
    /// `cvLine`
    unsafe fn line(
        &self,
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
    /// `cvRectangle`
    unsafe fn rectangle(
        &self,
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
    /// `cvCircle`
    unsafe fn circle(
        &self,
        img: *mut CvArr,
        center: CvPoint,
        radius: c_int,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );

    // === Contours (cv) ===

    /// `cvFindContours`, returns the number of contours or a negative status
    unsafe fn find_contours(
        &self,
        image: *mut CvArr,
        storage: *mut CvMemStorage,
        first_contour: *mut *mut CvSeq,
        header_size: c_int,
        mode: c_int,
        method: c_int,
        offset: CvPoint,
    ) -> c_int;
    /// `cvApproxPoly`
    unsafe fn approx_poly(
        &self,
        src_seq: *const c_void,
        header_size: c_int,
        storage: *mut CvMemStorage,
        method: c_int,
        eps: f64,
        recursive: c_int,
    ) -> *mut CvSeq;
    /// `cvContourArea`
    unsafe fn contour_area(&self, contour: *const CvArr, slice: CvSlice, oriented: c_int) -> f64;
    /// `cvArcLength`
    unsafe fn arc_length(&self, curve: *const c_void, slice: CvSlice, is_closed: c_int) -> f64;
    /// `cvCheckContourConvexity`
    unsafe fn check_contour_convexity(&self, contour: *const CvArr) -> c_int;
}
