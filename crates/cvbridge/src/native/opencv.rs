//! System OpenCV 2.x provider
//!
//! Links `opencv_core`, `opencv_imgproc` and `opencv_highgui` and forwards
//! each [`NativeApi`] method to the matching C function.
//!
//! In OpenCV 2.x the error-status functions (`cvGetErrStatus`,
//! `cvSetErrStatus`, `cvSetErrMode`) are stubs: the status always reads 0 and
//! every internal `cv::error` throws a C++ exception. An exception reaching
//! Rust aborts the process, and the bridge cannot catch it. With this
//! provider, `OperationFailed` therefore only comes from return values the
//! wrappers check themselves, such as `cvSaveImage` returning 0 or
//! `cvFindContours` returning a negative count. Validate sizes and formats
//! before calling into the library.

use std::os::raw::{c_char, c_int, c_schar, c_void};

use super::NativeApi;
use crate::sys::{
    CvArr, CvCapture, CvMemStorage, CvPoint, CvRect, CvScalar, CvSeq, CvSize, CvSlice,
    IplConvKernel, IplImage,
};

#[link(name = "opencv_core")]
extern "C" {
    fn cvGetErrStatus() -> c_int;
    fn cvSetErrStatus(status: c_int);
    fn cvSetErrMode(mode: c_int) -> c_int;
    fn cvErrorStr(status: c_int) -> *const c_char;

    fn cvCreateImage(size: CvSize, depth: c_int, channels: c_int) -> *mut IplImage;
    fn cvCloneImage(image: *const IplImage) -> *mut IplImage;
    fn cvReleaseImage(image: *mut *mut IplImage);
    fn cvGetSize(arr: *const CvArr) -> CvSize;
    fn cvSetImageCOI(image: *mut IplImage, coi: c_int);
    fn cvSetImageROI(image: *mut IplImage, rect: CvRect);
    fn cvResetImageROI(image: *mut IplImage);

    fn cvCreateMemStorage(block_size: c_int) -> *mut CvMemStorage;
    fn cvClearMemStorage(storage: *mut CvMemStorage);
    fn cvReleaseMemStorage(storage: *mut *mut CvMemStorage);
    fn cvCreateSeq(
        seq_flags: c_int,
        header_size: usize,
        elem_size: usize,
        storage: *mut CvMemStorage,
    ) -> *mut CvSeq;
    fn cvSeqPush(seq: *mut CvSeq, element: *const c_void) -> *mut c_schar;
    fn cvGetSeqElem(seq: *const CvSeq, index: c_int) -> *mut c_schar;

    fn cvCopy(src: *const CvArr, dst: *mut CvArr, mask: *const CvArr);
    fn cvConvertScale(src: *const CvArr, dst: *mut CvArr, scale: f64, shift: f64);
    fn cvAnd(src1: *const CvArr, src2: *const CvArr, dst: *mut CvArr, mask: *const CvArr);
    fn cvOr(src1: *const CvArr, src2: *const CvArr, dst: *mut CvArr, mask: *const CvArr);
    fn cvSplit(
        src: *const CvArr,
        dst0: *mut CvArr,
        dst1: *mut CvArr,
        dst2: *mut CvArr,
        dst3: *mut CvArr,
    );

    fn cvPolyLine(
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
    fn cvLine(
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
    fn cvRectangle(
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
    fn cvCircle(
        img: *mut CvArr,
        center: CvPoint,
        radius: c_int,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    );
}

#[link(name = "opencv_imgproc")]
extern "C" {
    fn cvCvtColor(src: *const CvArr, dst: *mut CvArr, code: c_int);
    fn cvThreshold(
        src: *const CvArr,
        dst: *mut CvArr,
        threshold: f64,
        max_value: f64,
        threshold_type: c_int,
    ) -> f64;
    fn cvPyrDown(src: *const CvArr, dst: *mut CvArr, filter: c_int);
    fn cvPyrUp(src: *const CvArr, dst: *mut CvArr, filter: c_int);
    fn cvCreateStructuringElementEx(
        cols: c_int,
        rows: c_int,
        anchor_x: c_int,
        anchor_y: c_int,
        shape: c_int,
        values: *mut c_int,
    ) -> *mut IplConvKernel;
    fn cvReleaseStructuringElement(element: *mut *mut IplConvKernel);
    fn cvDilate(src: *const CvArr, dst: *mut CvArr, element: *mut IplConvKernel, iterations: c_int);
    fn cvErode(src: *const CvArr, dst: *mut CvArr, element: *mut IplConvKernel, iterations: c_int);
    fn cvMorphologyEx(
        src: *const CvArr,
        dst: *mut CvArr,
        temp: *mut CvArr,
        element: *mut IplConvKernel,
        operation: c_int,
        iterations: c_int,
    );
    fn cvFindContours(
        image: *mut CvArr,
        storage: *mut CvMemStorage,
        first_contour: *mut *mut CvSeq,
        header_size: c_int,
        mode: c_int,
        method: c_int,
        offset: CvPoint,
    ) -> c_int;
    fn cvApproxPoly(
        src_seq: *const c_void,
        header_size: c_int,
        storage: *mut CvMemStorage,
        method: c_int,
        eps: f64,
        recursive: c_int,
    ) -> *mut CvSeq;
    fn cvContourArea(contour: *const CvArr, slice: CvSlice, oriented: c_int) -> f64;
    fn cvArcLength(curve: *const c_void, slice: CvSlice, is_closed: c_int) -> f64;
    fn cvCheckContourConvexity(contour: *const CvArr) -> c_int;
}

#[link(name = "opencv_highgui")]
extern "C" {
    fn cvCreateCameraCapture(index: c_int) -> *mut CvCapture;
    fn cvCreateFileCapture(filename: *const c_char) -> *mut CvCapture;
    fn cvQueryFrame(capture: *mut CvCapture) -> *mut IplImage;
    fn cvReleaseCapture(capture: *mut *mut CvCapture);
    fn cvLoadImage(filename: *const c_char, iscolor: c_int) -> *mut IplImage;
    fn cvSaveImage(filename: *const c_char, image: *const CvArr, params: *const c_int) -> c_int;
    fn cvNamedWindow(name: *const c_char, flags: c_int) -> c_int;
    fn cvShowImage(name: *const c_char, image: *const CvArr);
    fn cvWaitKey(delay: c_int) -> c_int;
    fn cvDestroyWindow(name: *const c_char);
    fn cvDestroyAllWindows();
}

/// Provider backed by the system OpenCV libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCv;

impl OpenCv {
    pub fn new() -> Self {
        Self
    }
}

#[allow(clippy::too_many_arguments)]
impl NativeApi for OpenCv {
    fn name(&self) -> &'static str {
        "opencv"
    }

    unsafe fn get_err_status(&self) -> c_int {
        cvGetErrStatus()
    }

    unsafe fn set_err_status(&self, status: c_int) {
        cvSetErrStatus(status)
    }

    unsafe fn set_err_mode(&self, mode: c_int) -> c_int {
        cvSetErrMode(mode)
    }

    unsafe fn error_str(&self, status: c_int) -> *const c_char {
        cvErrorStr(status)
    }

    unsafe fn create_image(&self, size: CvSize, depth: c_int, channels: c_int) -> *mut IplImage {
        cvCreateImage(size, depth, channels)
    }

    unsafe fn clone_image(&self, image: *const IplImage) -> *mut IplImage {
        cvCloneImage(image)
    }

    unsafe fn release_image(&self, image: *mut *mut IplImage) {
        cvReleaseImage(image)
    }

    unsafe fn get_size(&self, arr: *const CvArr) -> CvSize {
        cvGetSize(arr)
    }

    unsafe fn set_image_coi(&self, image: *mut IplImage, coi: c_int) {
        cvSetImageCOI(image, coi)
    }

    unsafe fn set_image_roi(&self, image: *mut IplImage, rect: CvRect) {
        cvSetImageROI(image, rect)
    }

    unsafe fn reset_image_roi(&self, image: *mut IplImage) {
        cvResetImageROI(image)
    }

    unsafe fn create_mem_storage(&self, block_size: c_int) -> *mut CvMemStorage {
        cvCreateMemStorage(block_size)
    }

    unsafe fn clear_mem_storage(&self, storage: *mut CvMemStorage) {
        cvClearMemStorage(storage)
    }

    unsafe fn release_mem_storage(&self, storage: *mut *mut CvMemStorage) {
        cvReleaseMemStorage(storage)
    }

    unsafe fn create_seq(
        &self,
        seq_flags: c_int,
        header_size: usize,
        elem_size: usize,
        storage: *mut CvMemStorage,
    ) -> *mut CvSeq {
        cvCreateSeq(seq_flags, header_size, elem_size, storage)
    }

    unsafe fn seq_push(&self, seq: *mut CvSeq, element: *const c_void) -> *mut c_schar {
        cvSeqPush(seq, element)
    }

    unsafe fn get_seq_elem(&self, seq: *const CvSeq, index: c_int) -> *mut c_schar {
        cvGetSeqElem(seq, index)
    }

    unsafe fn create_structuring_element_ex(
        &self,
        cols: c_int,
        rows: c_int,
        anchor_x: c_int,
        anchor_y: c_int,
        shape: c_int,
        values: *mut c_int,
    ) -> *mut IplConvKernel {
        cvCreateStructuringElementEx(cols, rows, anchor_x, anchor_y, shape, values)
    }

    unsafe fn release_structuring_element(&self, element: *mut *mut IplConvKernel) {
        cvReleaseStructuringElement(element)
    }

    unsafe fn create_camera_capture(&self, index: c_int) -> *mut CvCapture {
        cvCreateCameraCapture(index)
    }

    unsafe fn create_file_capture(&self, filename: *const c_char) -> *mut CvCapture {
        cvCreateFileCapture(filename)
    }

    unsafe fn query_frame(&self, capture: *mut CvCapture) -> *mut IplImage {
        cvQueryFrame(capture)
    }

    unsafe fn release_capture(&self, capture: *mut *mut CvCapture) {
        cvReleaseCapture(capture)
    }

    unsafe fn load_image(&self, filename: *const c_char, iscolor: c_int) -> *mut IplImage {
        cvLoadImage(filename, iscolor)
    }

    unsafe fn save_image(
        &self,
        filename: *const c_char,
        image: *const CvArr,
        params: *const c_int,
    ) -> c_int {
        cvSaveImage(filename, image, params)
    }

    unsafe fn named_window(&self, name: *const c_char, flags: c_int) -> c_int {
        cvNamedWindow(name, flags)
    }

    unsafe fn show_image(&self, name: *const c_char, image: *const CvArr) {
        cvShowImage(name, image)
    }

    unsafe fn wait_key(&self, delay: c_int) -> c_int {
        cvWaitKey(delay)
    }

    unsafe fn destroy_window(&self, name: *const c_char) {
        cvDestroyWindow(name)
    }

    unsafe fn destroy_all_windows(&self) {
        cvDestroyAllWindows()
    }

    unsafe fn copy(&self, src: *const CvArr, dst: *mut CvArr, mask: *const CvArr) {
        cvCopy(src, dst, mask)
    }

    unsafe fn convert_scale(&self, src: *const CvArr, dst: *mut CvArr, scale: f64, shift: f64) {
        cvConvertScale(src, dst, scale, shift)
    }

    unsafe fn and(
        &self,
        src1: *const CvArr,
        src2: *const CvArr,
        dst: *mut CvArr,
        mask: *const CvArr,
    ) {
        cvAnd(src1, src2, dst, mask)
    }

    unsafe fn or(&self, src1: *const CvArr, src2: *const CvArr, dst: *mut CvArr, mask: *const CvArr) {
        cvOr(src1, src2, dst, mask)
    }

    unsafe fn split(
        &self,
        src: *const CvArr,
        dst0: *mut CvArr,
        dst1: *mut CvArr,
        dst2: *mut CvArr,
        dst3: *mut CvArr,
    ) {
        cvSplit(src, dst0, dst1, dst2, dst3)
    }

    unsafe fn cvt_color(&self, src: *const CvArr, dst: *mut CvArr, code: c_int) {
        cvCvtColor(src, dst, code)
    }

    unsafe fn threshold(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        threshold: f64,
        max_value: f64,
        threshold_type: c_int,
    ) -> f64 {
        cvThreshold(src, dst, threshold, max_value, threshold_type)
    }

    unsafe fn pyr_down(&self, src: *const CvArr, dst: *mut CvArr, filter: c_int) {
        cvPyrDown(src, dst, filter)
    }

    unsafe fn pyr_up(&self, src: *const CvArr, dst: *mut CvArr, filter: c_int) {
        cvPyrUp(src, dst, filter)
    }

    unsafe fn dilate(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        element: *mut IplConvKernel,
        iterations: c_int,
    ) {
        cvDilate(src, dst, element, iterations)
    }

    unsafe fn erode(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        element: *mut IplConvKernel,
        iterations: c_int,
    ) {
        cvErode(src, dst, element, iterations)
    }

    unsafe fn morphology_ex(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        temp: *mut CvArr,
        element: *mut IplConvKernel,
        operation: c_int,
        iterations: c_int,
    ) {
        cvMorphologyEx(src, dst, temp, element, operation, iterations)
    }

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
    ) {
        cvPolyLine(img, pts, npts, contours, is_closed, color, thickness, line_type, shift)
    }

    unsafe fn line(
        &self,
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    ) {
        cvLine(img, pt1, pt2, color, thickness, line_type, shift)
    }

    unsafe fn rectangle(
        &self,
        img: *mut CvArr,
        pt1: CvPoint,
        pt2: CvPoint,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    ) {
        cvRectangle(img, pt1, pt2, color, thickness, line_type, shift)
    }

    unsafe fn circle(
        &self,
        img: *mut CvArr,
        center: CvPoint,
        radius: c_int,
        color: CvScalar,
        thickness: c_int,
        line_type: c_int,
        shift: c_int,
    ) {
        cvCircle(img, center, radius, color, thickness, line_type, shift)
    }

    unsafe fn find_contours(
        &self,
        image: *mut CvArr,
        storage: *mut CvMemStorage,
        first_contour: *mut *mut CvSeq,
        header_size: c_int,
        mode: c_int,
        method: c_int,
        offset: CvPoint,
    ) -> c_int {
        cvFindContours(image, storage, first_contour, header_size, mode, method, offset)
    }

    unsafe fn approx_poly(
        &self,
        src_seq: *const c_void,
        header_size: c_int,
        storage: *mut CvMemStorage,
        method: c_int,
        eps: f64,
        recursive: c_int,
    ) -> *mut CvSeq {
        cvApproxPoly(src_seq, header_size, storage, method, eps, recursive)
    }

    unsafe fn contour_area(&self, contour: *const CvArr, slice: CvSlice, oriented: c_int) -> f64 {
        cvContourArea(contour, slice, oriented)
    }

    unsafe fn arc_length(&self, curve: *const c_void, slice: CvSlice, is_closed: c_int) -> f64 {
        cvArcLength(curve, slice, is_closed)
    }

    unsafe fn check_contour_convexity(&self, contour: *const CvArr) -> c_int {
        cvCheckContourConvexity(contour)
    }
}
