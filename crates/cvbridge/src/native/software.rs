//! In-process native provider
//!
//! `SoftwareBackend` implements the allocation and lifetime half of the C
//! API with the same record layouts as the real library, so the bridge,
//! handles and typed resources run unchanged on top of it:
//!
//! - images with 4-byte aligned rows, region and channel of interest
//! - bump-allocated memory storages with sequences carved from them
//! - structuring elements
//! - synthetic captures that hand out one reused frame buffer
//! - a window registry with scripted key presses
//! - file load and save through the `image` crate
//!
//! Pure memory movement (`copy`, `and`, `or`, 8-bit `convert_scale`,
//! `split`) is implemented. Every algorithmic entry point sets
//! `CV_STS_NOT_IMPLEMENTED` in the error status and returns a neutral value.
//!
//! The provider records the first thread that calls into it and counts calls
//! arriving from any other thread, which tests use to observe thread
//! affinity.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::CStr;
use std::mem::size_of;
use std::os::raw::{c_char, c_int, c_schar, c_void};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use super::NativeApi;
use crate::convert;
use crate::sys::*;

/// Shape of a synthetic capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipSpec {
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    /// Frames before end of stream, `None` for an endless camera
    pub frames: Option<u32>,
}

impl ClipSpec {
    /// An endless 3-channel source
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            channels: 3,
            frames: None,
        }
    }

    pub fn with_channels(mut self, channels: i32) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = Some(frames);
        self
    }
}

/// Live allocation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftwareStats {
    /// Caller-owned images (capture frames excluded)
    pub live_images: usize,
    pub live_storages: usize,
    pub live_sequences: usize,
    pub live_kernels: usize,
    pub live_captures: usize,
    pub open_windows: usize,
    pub images_created: u64,
    pub images_released: u64,
}

/// State of one named window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowInfo {
    pub flags: i32,
    pub frames_shown: u64,
    /// Size of the last image shown
    pub last_size: Option<(i32, i32)>,
}

struct ImageAlloc {
    data: usize,
    len: usize,
    capture_owned: bool,
}

struct Block {
    addr: usize,
    words: usize,
}

/// One memory storage: a list of zeroed blocks and the sequences carved
/// from them, each with its element addresses in push order.
struct Arena {
    header: usize,
    block_size: usize,
    blocks: Vec<Block>,
    used: usize,
    sequences: HashMap<usize, Vec<usize>>,
}

impl Arena {
    unsafe fn alloc(&mut self, bytes: usize) -> usize {
        let bytes = bytes.max(1).next_multiple_of(8);
        let fits = self
            .blocks
            .last()
            .is_some_and(|block| self.used + bytes <= block.words * 8);

        if !fits {
            let words = bytes.max(self.block_size).div_ceil(8);
            let block: Box<[u64]> = vec![0u64; words].into_boxed_slice();
            let addr = Box::into_raw(block) as *mut u64 as usize;
            self.blocks.push(Block { addr, words });
            self.used = 0;
        }

        let block = &self.blocks[self.blocks.len() - 1];
        let addr = block.addr + self.used;
        self.used += bytes;
        ptr::write_bytes(addr as *mut u8, 0, bytes);

        let header = self.header as *mut CvMemStorage;
        (*header).free_space = self.free_space() as c_int;
        addr
    }

    fn free_space(&self) -> usize {
        self.blocks
            .last()
            .map_or(0, |block| block.words * 8 - self.used)
    }

    unsafe fn free_blocks(&mut self) {
        for block in self.blocks.drain(..) {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                block.addr as *mut u64,
                block.words,
            )));
        }
        self.used = 0;
        let header = self.header as *mut CvMemStorage;
        (*header).free_space = 0;
    }
}

struct KernelAlloc {
    values: usize,
    len: usize,
}

struct CaptureState {
    spec: ClipSpec,
    produced: u32,
    frame: usize,
}

/// Byte view of an image's region of interest.
#[derive(Clone, Copy)]
struct View {
    data: *mut u8,
    width: usize,
    height: usize,
    step: usize,
    pixel: usize,
    channels: usize,
    depth: c_int,
}

impl View {
    unsafe fn at(&self, x: usize, y: usize) -> *mut u8 {
        self.data.add(y * self.step + x * self.pixel)
    }

    fn same_size(&self, other: &View) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn same_type(&self, other: &View) -> bool {
        self.channels == other.channels && self.depth == other.depth
    }
}

fn bytes_per_channel(depth: c_int) -> Option<usize> {
    match depth {
        IPL_DEPTH_8U | IPL_DEPTH_8S => Some(1),
        IPL_DEPTH_16U | IPL_DEPTH_16S => Some(2),
        IPL_DEPTH_32S | IPL_DEPTH_32F => Some(4),
        IPL_DEPTH_64F => Some(8),
        _ => None,
    }
}

fn chars4(text: &[u8]) -> [c_char; 4] {
    let mut out = [0 as c_char; 4];
    for (slot, byte) in out.iter_mut().zip(text) {
        *slot = *byte as c_char;
    }
    out
}

fn status_text(status: c_int) -> &'static CStr {
    match status {
        CV_STS_OK => c"No Error",
        CV_STS_ERROR => c"Unspecified error",
        CV_STS_NO_MEM => c"Insufficient memory",
        CV_STS_BAD_ARG => c"Bad argument",
        CV_STS_NULL_PTR => c"Null pointer",
        CV_STS_BAD_SIZE => c"Incorrect size of input array",
        CV_STS_OBJECT_NOT_FOUND => c"Requested object was not found",
        CV_STS_UNMATCHED_FORMATS => c"Formats of input arguments do not match",
        CV_STS_UNMATCHED_SIZES => c"Sizes of input arguments do not match",
        CV_STS_UNSUPPORTED_FORMAT => c"Unsupported format or combination of formats",
        CV_STS_OUT_OF_RANGE => c"One of arguments' values is out of range",
        CV_STS_NOT_IMPLEMENTED => c"The function/feature is not implemented",
        _ => c"Unknown error / status code",
    }
}

#[derive(Default)]
struct State {
    status: c_int,
    err_mode: c_int,
    image_limit: Option<usize>,
    images: HashMap<usize, ImageAlloc>,
    storages: HashMap<usize, Arena>,
    /// Sequence address to owning storage address
    seq_owner: HashMap<usize, usize>,
    kernels: HashMap<usize, KernelAlloc>,
    captures: HashMap<usize, CaptureState>,
    cameras: BTreeMap<c_int, ClipSpec>,
    clips: HashMap<String, ClipSpec>,
    windows: BTreeMap<String, WindowInfo>,
    keys: VecDeque<c_int>,
    images_created: u64,
    images_released: u64,
}

impl State {
    fn fail(&mut self, entry: &'static str, status: c_int) {
        debug!(entry, status, "software provider rejected call");
        self.status = status;
    }

    fn caller_images(&self) -> usize {
        self.images.values().filter(|a| !a.capture_owned).count()
    }

    fn allocate_image(
        &mut self,
        size: CvSize,
        depth: c_int,
        channels: c_int,
        capture_owned: bool,
    ) -> Result<*mut IplImage, c_int> {
        if size.width <= 0 || size.height <= 0 {
            return Err(CV_STS_BAD_SIZE);
        }
        if !(1..=4).contains(&channels) {
            return Err(CV_STS_BAD_ARG);
        }
        let bpc = bytes_per_channel(depth).ok_or(CV_STS_UNSUPPORTED_FORMAT)?;
        if !capture_owned {
            if let Some(limit) = self.image_limit {
                if self.caller_images() >= limit {
                    return Err(CV_STS_NO_MEM);
                }
            }
        }

        let row = (size.width as usize)
            .checked_mul(channels as usize * bpc)
            .ok_or(CV_STS_NO_MEM)?;
        let width_step = row.checked_add(3).ok_or(CV_STS_NO_MEM)? & !3;
        let len = width_step
            .checked_mul(size.height as usize)
            .ok_or(CV_STS_NO_MEM)?;
        let image_size = c_int::try_from(len).map_err(|_| CV_STS_NO_MEM)?;

        let data = Box::into_raw(vec![0u8; len].into_boxed_slice()) as *mut u8;
        let (model, seq): (&[u8], &[u8]) = match channels {
            1 => (b"GRAY", b"GRAY"),
            3 => (b"RGB", b"BGR"),
            4 => (b"RGB", b"BGRA"),
            _ => (b"", b""),
        };

        let header = Box::into_raw(Box::new(IplImage {
            n_size: size_of::<IplImage>() as c_int,
            id: 0,
            n_channels: channels,
            alpha_channel: 0,
            depth,
            color_model: chars4(model),
            channel_seq: chars4(seq),
            data_order: IPL_DATA_ORDER_PIXEL,
            origin: IPL_ORIGIN_TL,
            align: IPL_ALIGN_4BYTES,
            width: size.width,
            height: size.height,
            roi: ptr::null_mut(),
            mask_roi: ptr::null_mut(),
            image_id: ptr::null_mut(),
            tile_info: ptr::null_mut(),
            image_size,
            image_data: data as *mut c_char,
            width_step: width_step as c_int,
            border_mode: [0; 4],
            border_const: [0; 4],
            image_data_origin: data as *mut c_char,
        }));

        self.images.insert(
            header as usize,
            ImageAlloc {
                data: data as usize,
                len,
                capture_owned,
            },
        );
        if !capture_owned {
            self.images_created += 1;
        }
        Ok(header)
    }

    unsafe fn free_image(header: *mut IplImage, alloc: ImageAlloc) {
        let roi = (*header).roi;
        if !roi.is_null() {
            drop(Box::from_raw(roi));
        }
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            alloc.data as *mut u8,
            alloc.len,
        )));
        drop(Box::from_raw(header));
    }

    fn known_image(&self, image: *const IplImage) -> Result<*mut IplImage, c_int> {
        if image.is_null() {
            return Err(CV_STS_NULL_PTR);
        }
        if !self.images.contains_key(&(image as usize)) {
            return Err(CV_STS_BAD_ARG);
        }
        Ok(image as *mut IplImage)
    }

    unsafe fn view(&self, arr: *const CvArr) -> Result<View, c_int> {
        let header = &*self.known_image(arr as *const IplImage)?;
        let bpc = bytes_per_channel(header.depth).ok_or(CV_STS_UNSUPPORTED_FORMAT)?;
        let channels = header.n_channels as usize;
        let pixel = bpc * channels;
        let step = header.width_step as usize;

        let (x, y, width, height) = if header.roi.is_null() {
            (0, 0, header.width, header.height)
        } else {
            let roi = &*header.roi;
            (roi.x_offset, roi.y_offset, roi.width, roi.height)
        };

        Ok(View {
            data: (header.image_data as *mut u8).add(y as usize * step + x as usize * pixel),
            width: width as usize,
            height: height as usize,
            step,
            pixel,
            channels,
            depth: header.depth,
        })
    }

    unsafe fn mask_view(&self, mask: *const CvArr, like: &View) -> Result<Option<View>, c_int> {
        if mask.is_null() {
            return Ok(None);
        }
        let mask = self.view(mask)?;
        if mask.depth != IPL_DEPTH_8U || mask.channels != 1 {
            return Err(CV_STS_UNSUPPORTED_FORMAT);
        }
        if !mask.same_size(like) {
            return Err(CV_STS_UNMATCHED_SIZES);
        }
        Ok(Some(mask))
    }

    unsafe fn copy(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        mask: *const CvArr,
    ) -> Result<(), c_int> {
        let s = self.view(src)?;
        let d = self.view(dst)?;
        if !s.same_size(&d) {
            return Err(CV_STS_UNMATCHED_SIZES);
        }
        if !s.same_type(&d) {
            return Err(CV_STS_UNMATCHED_FORMATS);
        }
        let mask = self.mask_view(mask, &s)?;

        for y in 0..s.height {
            match mask {
                None => ptr::copy(s.at(0, y), d.at(0, y), s.width * s.pixel),
                Some(m) => {
                    for x in 0..s.width {
                        if *m.at(x, y) != 0 {
                            ptr::copy(s.at(x, y), d.at(x, y), s.pixel);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    unsafe fn bitwise(
        &self,
        src1: *const CvArr,
        src2: *const CvArr,
        dst: *mut CvArr,
        mask: *const CvArr,
        op: fn(u8, u8) -> u8,
    ) -> Result<(), c_int> {
        let a = self.view(src1)?;
        let b = self.view(src2)?;
        let d = self.view(dst)?;
        if !a.same_size(&b) || !a.same_size(&d) {
            return Err(CV_STS_UNMATCHED_SIZES);
        }
        if !a.same_type(&b) || !a.same_type(&d) {
            return Err(CV_STS_UNMATCHED_FORMATS);
        }
        let mask = self.mask_view(mask, &a)?;

        for y in 0..a.height {
            for x in 0..a.width {
                if let Some(m) = mask {
                    if *m.at(x, y) == 0 {
                        continue;
                    }
                }
                let (pa, pb, pd) = (a.at(x, y), b.at(x, y), d.at(x, y));
                for i in 0..a.pixel {
                    *pd.add(i) = op(*pa.add(i), *pb.add(i));
                }
            }
        }
        Ok(())
    }

    unsafe fn convert_scale(
        &self,
        src: *const CvArr,
        dst: *mut CvArr,
        scale: f64,
        shift: f64,
    ) -> Result<(), c_int> {
        let s = self.view(src)?;
        let d = self.view(dst)?;
        if !s.same_size(&d) {
            return Err(CV_STS_UNMATCHED_SIZES);
        }
        if s.channels != d.channels {
            return Err(CV_STS_UNMATCHED_FORMATS);
        }
        if s.depth != IPL_DEPTH_8U || d.depth != IPL_DEPTH_8U {
            return Err(CV_STS_UNSUPPORTED_FORMAT);
        }

        for y in 0..s.height {
            let (ps, pd) = (s.at(0, y), d.at(0, y));
            for i in 0..s.width * s.pixel {
                let value = (f64::from(*ps.add(i)) * scale + shift).round_ties_even();
                *pd.add(i) = value.clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    }

    unsafe fn split(&self, src: *const CvArr, dsts: [*mut CvArr; 4]) -> Result<(), c_int> {
        let s = self.view(src)?;
        let wanted = dsts.iter().filter(|d| !d.is_null()).count();
        if wanted == 0 {
            return Err(CV_STS_NULL_PTR);
        }
        if wanted != 1 && wanted != s.channels {
            return Err(CV_STS_BAD_ARG);
        }

        let bpc = s.pixel / s.channels;
        for (channel, dst) in dsts.iter().enumerate() {
            if dst.is_null() {
                continue;
            }
            if channel >= s.channels {
                return Err(CV_STS_BAD_ARG);
            }
            let d = self.view(*dst)?;
            if d.channels != 1 || d.depth != s.depth {
                return Err(CV_STS_UNMATCHED_FORMATS);
            }
            if !d.same_size(&s) {
                return Err(CV_STS_UNMATCHED_SIZES);
            }
            for y in 0..s.height {
                for x in 0..s.width {
                    ptr::copy_nonoverlapping(s.at(x, y).add(channel * bpc), d.at(x, y), bpc);
                }
            }
        }
        Ok(())
    }

    fn open_capture(&mut self, spec: ClipSpec) -> Result<*mut CvCapture, c_int> {
        let size = CvSize {
            width: spec.width,
            height: spec.height,
        };
        let frame = self.allocate_image(size, IPL_DEPTH_8U, spec.channels, true)?;
        let capture = Box::into_raw(Box::new(0u64)) as *mut CvCapture;
        self.captures.insert(
            capture as usize,
            CaptureState {
                spec,
                produced: 0,
                frame: frame as usize,
            },
        );
        Ok(capture)
    }

    unsafe fn close_capture(&mut self, capture: usize) -> bool {
        let Some(state) = self.captures.remove(&capture) else {
            return false;
        };
        if let Some(alloc) = self.images.remove(&state.frame) {
            Self::free_image(state.frame as *mut IplImage, alloc);
        }
        drop(Box::from_raw(capture as *mut u64));
        true
    }

    unsafe fn forget_sequences(&mut self, storage: usize) {
        if let Some(arena) = self.storages.get_mut(&storage) {
            for seq in arena.sequences.keys() {
                self.seq_owner.remove(seq);
            }
            arena.sequences.clear();
            arena.free_blocks();
        }
    }
}

impl Drop for State {
    fn drop(&mut self) {
        let leaked = self.caller_images() + self.storages.len() + self.kernels.len();
        if leaked > 0 {
            debug!(leaked, "software provider freeing unreleased objects");
        }
        unsafe {
            let captures: Vec<usize> = self.captures.keys().copied().collect();
            for capture in captures {
                self.close_capture(capture);
            }
            for (header, alloc) in self.images.drain() {
                Self::free_image(header as *mut IplImage, alloc);
            }
            for (header, kernel) in self.kernels.drain() {
                drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                    kernel.values as *mut c_int,
                    kernel.len,
                )));
                drop(Box::from_raw(header as *mut IplConvKernel));
            }
            for (header, mut arena) in self.storages.drain() {
                arena.free_blocks();
                drop(Box::from_raw(header as *mut CvMemStorage));
            }
        }
    }
}

/// In-process implementation of [`NativeApi`].
pub struct SoftwareBackend {
    state: Mutex<State>,
    owner: OnceLock<ThreadId>,
    foreign_calls: AtomicU64,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SoftwareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareBackend")
            .field("stats", &self.stats())
            .field("owner", &self.owner.get())
            .finish()
    }
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            owner: OnceLock::new(),
            foreign_calls: AtomicU64::new(0),
        }
    }

    /// Register a camera reachable through `cvCreateCameraCapture(index)`
    pub fn with_camera(self, index: i32, spec: ClipSpec) -> Self {
        self.state.lock().cameras.insert(index, spec);
        self
    }

    /// Register a clip reachable through `cvCreateFileCapture(name)`
    pub fn with_clip(self, name: impl Into<String>, spec: ClipSpec) -> Self {
        self.state.lock().clips.insert(name.into(), spec);
        self
    }

    /// Fail image creation with `CV_STS_NO_MEM` beyond `limit` live images
    pub fn with_image_limit(self, limit: usize) -> Self {
        self.state.lock().image_limit = Some(limit);
        self
    }

    /// Queue a key code for the next `cvWaitKey`
    pub fn push_key(&self, key: i32) {
        self.state.lock().keys.push_back(key);
    }

    pub fn stats(&self) -> SoftwareStats {
        let state = self.state.lock();
        SoftwareStats {
            live_images: state.caller_images(),
            live_storages: state.storages.len(),
            live_sequences: state.seq_owner.len(),
            live_kernels: state.kernels.len(),
            live_captures: state.captures.len(),
            open_windows: state.windows.len(),
            images_created: state.images_created,
            images_released: state.images_released,
        }
    }

    pub fn window(&self, name: &str) -> Option<WindowInfo> {
        self.state.lock().windows.get(name).copied()
    }

    pub fn window_names(&self) -> Vec<String> {
        self.state.lock().windows.keys().cloned().collect()
    }

    /// First thread that called a native entry point
    pub fn owner_thread(&self) -> Option<ThreadId> {
        self.owner.get().copied()
    }

    /// Entry-point calls made from a thread other than the first caller
    pub fn foreign_thread_calls(&self) -> u64 {
        self.foreign_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, entry: &'static str) -> MutexGuard<'_, State> {
        let current = thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        if owner != current {
            self.foreign_calls.fetch_add(1, Ordering::SeqCst);
            warn!(entry, "native entry point called off the owning thread");
        }
        trace!(entry, "native call");
        self.state.lock()
    }

    fn not_implemented(&self, entry: &'static str) {
        self.enter(entry).fail(entry, CV_STS_NOT_IMPLEMENTED);
    }
}

#[allow(clippy::too_many_arguments)]
impl NativeApi for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    unsafe fn get_err_status(&self) -> c_int {
        self.enter("cvGetErrStatus").status
    }

    unsafe fn set_err_status(&self, status: c_int) {
        self.enter("cvSetErrStatus").status = status;
    }

    unsafe fn set_err_mode(&self, mode: c_int) -> c_int {
        std::mem::replace(&mut self.enter("cvSetErrMode").err_mode, mode)
    }

    unsafe fn error_str(&self, status: c_int) -> *const c_char {
        status_text(status).as_ptr()
    }

    unsafe fn create_image(&self, size: CvSize, depth: c_int, channels: c_int) -> *mut IplImage {
        let mut state = self.enter("cvCreateImage");
        match state.allocate_image(size, depth, channels, false) {
            Ok(image) => image,
            Err(status) => {
                state.fail("cvCreateImage", status);
                ptr::null_mut()
            }
        }
    }

    unsafe fn clone_image(&self, image: *const IplImage) -> *mut IplImage {
        let mut state = self.enter("cvCloneImage");
        let source = match state.known_image(image) {
            Ok(header) => header,
            Err(status) => {
                state.fail("cvCloneImage", status);
                return ptr::null_mut();
            }
        };

        let size = CvSize {
            width: (*source).width,
            height: (*source).height,
        };
        let copy = match state.allocate_image(size, (*source).depth, (*source).n_channels, false) {
            Ok(copy) => copy,
            Err(status) => {
                state.fail("cvCloneImage", status);
                return ptr::null_mut();
            }
        };

        ptr::copy_nonoverlapping(
            (*source).image_data as *const u8,
            (*copy).image_data as *mut u8,
            (*source).image_size as usize,
        );
        if !(*source).roi.is_null() {
            (*copy).roi = Box::into_raw(Box::new(*(*source).roi));
        }
        copy
    }

    unsafe fn release_image(&self, image: *mut *mut IplImage) {
        let mut state = self.enter("cvReleaseImage");
        if image.is_null() {
            state.fail("cvReleaseImage", CV_STS_NULL_PTR);
            return;
        }
        let header = *image;
        if header.is_null() {
            return;
        }
        match state.images.get(&(header as usize)) {
            None => state.fail("cvReleaseImage", CV_STS_BAD_ARG),
            Some(alloc) if alloc.capture_owned => {
                warn!("attempt to release a frame owned by its capture");
                state.fail("cvReleaseImage", CV_STS_BAD_ARG);
            }
            Some(_) => {
                if let Some(alloc) = state.images.remove(&(header as usize)) {
                    State::free_image(header, alloc);
                    state.images_released += 1;
                }
                *image = ptr::null_mut();
            }
        }
    }

    unsafe fn get_size(&self, arr: *const CvArr) -> CvSize {
        let mut state = self.enter("cvGetSize");
        // A live sequence reads as one row of `total` elements
        if state.seq_owner.contains_key(&(arr as usize)) {
            let seq = &*(arr as *const CvSeq);
            return CvSize {
                width: seq.total,
                height: 1,
            };
        }
        match state.view(arr) {
            Ok(view) => CvSize {
                width: view.width as c_int,
                height: view.height as c_int,
            },
            Err(status) => {
                state.fail("cvGetSize", status);
                CvSize::default()
            }
        }
    }

    unsafe fn set_image_coi(&self, image: *mut IplImage, coi: c_int) {
        let mut state = self.enter("cvSetImageCOI");
        let header = match state.known_image(image) {
            Ok(header) => &mut *header,
            Err(status) => return state.fail("cvSetImageCOI", status),
        };
        if coi < 0 || coi > header.n_channels {
            return state.fail("cvSetImageCOI", CV_STS_BAD_ARG);
        }
        if header.roi.is_null() {
            header.roi = Box::into_raw(Box::new(IplROI {
                coi,
                x_offset: 0,
                y_offset: 0,
                width: header.width,
                height: header.height,
            }));
        } else {
            (*header.roi).coi = coi;
        }
    }

    unsafe fn set_image_roi(&self, image: *mut IplImage, rect: CvRect) {
        let mut state = self.enter("cvSetImageROI");
        let header = match state.known_image(image) {
            Ok(header) => &mut *header,
            Err(status) => return state.fail("cvSetImageROI", status),
        };

        let x = rect.x.clamp(0, header.width);
        let y = rect.y.clamp(0, header.height);
        let right = rect.x.saturating_add(rect.width).min(header.width);
        let bottom = rect.y.saturating_add(rect.height).min(header.height);
        if right <= x || bottom <= y {
            return state.fail("cvSetImageROI", CV_STS_BAD_ARG);
        }

        let coi = if header.roi.is_null() {
            0
        } else {
            (*header.roi).coi
        };
        let roi = IplROI {
            coi,
            x_offset: x,
            y_offset: y,
            width: right - x,
            height: bottom - y,
        };
        if header.roi.is_null() {
            header.roi = Box::into_raw(Box::new(roi));
        } else {
            *header.roi = roi;
        }
    }

    unsafe fn reset_image_roi(&self, image: *mut IplImage) {
        let mut state = self.enter("cvResetImageROI");
        let header = match state.known_image(image) {
            Ok(header) => &mut *header,
            Err(status) => return state.fail("cvResetImageROI", status),
        };
        if !header.roi.is_null() {
            drop(Box::from_raw(header.roi));
            header.roi = ptr::null_mut();
        }
    }

    unsafe fn create_mem_storage(&self, block_size: c_int) -> *mut CvMemStorage {
        let mut state = self.enter("cvCreateMemStorage");
        if block_size < 0 {
            state.fail("cvCreateMemStorage", CV_STS_BAD_SIZE);
            return ptr::null_mut();
        }
        let block_size = if block_size == 0 {
            CV_STORAGE_BLOCK_SIZE
        } else {
            block_size
        };

        let header = Box::into_raw(Box::new(CvMemStorage {
            signature: CV_STORAGE_MAGIC_VAL,
            bottom: ptr::null_mut(),
            top: ptr::null_mut(),
            parent: ptr::null_mut(),
            block_size,
            free_space: 0,
        }));
        state.storages.insert(
            header as usize,
            Arena {
                header: header as usize,
                block_size: block_size as usize,
                blocks: Vec::new(),
                used: 0,
                sequences: HashMap::new(),
            },
        );
        header
    }

    unsafe fn clear_mem_storage(&self, storage: *mut CvMemStorage) {
        let mut state = self.enter("cvClearMemStorage");
        if storage.is_null() {
            return state.fail("cvClearMemStorage", CV_STS_NULL_PTR);
        }
        if !state.storages.contains_key(&(storage as usize)) {
            return state.fail("cvClearMemStorage", CV_STS_BAD_ARG);
        }
        state.forget_sequences(storage as usize);
    }

    unsafe fn release_mem_storage(&self, storage: *mut *mut CvMemStorage) {
        let mut state = self.enter("cvReleaseMemStorage");
        if storage.is_null() {
            return state.fail("cvReleaseMemStorage", CV_STS_NULL_PTR);
        }
        let header = *storage;
        if header.is_null() {
            return;
        }
        if !state.storages.contains_key(&(header as usize)) {
            return state.fail("cvReleaseMemStorage", CV_STS_BAD_ARG);
        }
        state.forget_sequences(header as usize);
        state.storages.remove(&(header as usize));
        drop(Box::from_raw(header));
        *storage = ptr::null_mut();
    }

    unsafe fn create_seq(
        &self,
        seq_flags: c_int,
        header_size: usize,
        elem_size: usize,
        storage: *mut CvMemStorage,
    ) -> *mut CvSeq {
        let mut state = self.enter("cvCreateSeq");
        if storage.is_null() {
            state.fail("cvCreateSeq", CV_STS_NULL_PTR);
            return ptr::null_mut();
        }
        if header_size < size_of::<CvSeq>() || elem_size == 0 || elem_size > c_int::MAX as usize
        {
            state.fail("cvCreateSeq", CV_STS_BAD_SIZE);
            return ptr::null_mut();
        }
        let Some(arena) = state.storages.get_mut(&(storage as usize)) else {
            state.fail("cvCreateSeq", CV_STS_BAD_ARG);
            return ptr::null_mut();
        };

        let addr = arena.alloc(header_size);
        ptr::write(
            addr as *mut CvSeq,
            CvSeq {
                flags: (seq_flags & !CV_MAGIC_MASK) | CV_SEQ_MAGIC_VAL,
                header_size: header_size as c_int,
                h_prev: ptr::null_mut(),
                h_next: ptr::null_mut(),
                v_prev: ptr::null_mut(),
                v_next: ptr::null_mut(),
                total: 0,
                elem_size: elem_size as c_int,
                block_max: ptr::null_mut(),
                ptr: ptr::null_mut(),
                delta_elems: 0,
                storage,
                free_blocks: ptr::null_mut(),
                first: ptr::null_mut(),
            },
        );
        arena.sequences.insert(addr, Vec::new());
        state.seq_owner.insert(addr, storage as usize);
        addr as *mut CvSeq
    }

    unsafe fn seq_push(&self, seq: *mut CvSeq, element: *const c_void) -> *mut c_schar {
        let mut state = self.enter("cvSeqPush");
        if seq.is_null() {
            state.fail("cvSeqPush", CV_STS_NULL_PTR);
            return ptr::null_mut();
        }
        let Some(&owner) = state.seq_owner.get(&(seq as usize)) else {
            state.fail("cvSeqPush", CV_STS_BAD_ARG);
            return ptr::null_mut();
        };
        let Some(arena) = state.storages.get_mut(&owner) else {
            state.fail("cvSeqPush", CV_STS_BAD_ARG);
            return ptr::null_mut();
        };

        let elem_size = (*seq).elem_size as usize;
        let slot = arena.alloc(elem_size);
        if !element.is_null() {
            ptr::copy_nonoverlapping(element as *const u8, slot as *mut u8, elem_size);
        }
        if let Some(elements) = arena.sequences.get_mut(&(seq as usize)) {
            elements.push(slot);
        }
        (*seq).total += 1;
        slot as *mut c_schar
    }

    unsafe fn get_seq_elem(&self, seq: *const CvSeq, index: c_int) -> *mut c_schar {
        let mut state = self.enter("cvGetSeqElem");
        if seq.is_null() {
            state.fail("cvGetSeqElem", CV_STS_NULL_PTR);
            return ptr::null_mut();
        }
        let element = state
            .seq_owner
            .get(&(seq as usize))
            .and_then(|owner| state.storages.get(owner))
            .and_then(|arena| arena.sequences.get(&(seq as usize)))
            .map(|elements| {
                let total = elements.len() as i64;
                let index = if index < 0 {
                    i64::from(index) + total
                } else {
                    i64::from(index)
                };
                if (0..total).contains(&index) {
                    elements[index as usize] as *mut c_schar
                } else {
                    ptr::null_mut()
                }
            });

        match element {
            Some(element) => element,
            None => {
                state.fail("cvGetSeqElem", CV_STS_BAD_ARG);
                ptr::null_mut()
            }
        }
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
        const ENTRY: &str = "cvCreateStructuringElementEx";
        let mut state = self.enter(ENTRY);
        if cols <= 0 || rows <= 0 || !(0..cols).contains(&anchor_x) || !(0..rows).contains(&anchor_y)
        {
            state.fail(ENTRY, CV_STS_BAD_ARG);
            return ptr::null_mut();
        }

        let (w, h) = (cols as usize, rows as usize);
        let cells: Vec<c_int> = match shape {
            CV_SHAPE_RECT => vec![1; w * h],
            CV_SHAPE_CROSS => (0..h)
                .flat_map(|y| {
                    (0..w).map(move |x| c_int::from(y == anchor_y as usize || x == anchor_x as usize))
                })
                .collect(),
            CV_SHAPE_CUSTOM if values.is_null() => {
                state.fail(ENTRY, CV_STS_NULL_PTR);
                return ptr::null_mut();
            }
            CV_SHAPE_CUSTOM => std::slice::from_raw_parts(values, w * h)
                .iter()
                .map(|v| c_int::from(*v != 0))
                .collect(),
            CV_SHAPE_ELLIPSE => {
                state.fail(ENTRY, CV_STS_NOT_IMPLEMENTED);
                return ptr::null_mut();
            }
            _ => {
                state.fail(ENTRY, CV_STS_BAD_ARG);
                return ptr::null_mut();
            }
        };

        let len = cells.len();
        let values = Box::into_raw(cells.into_boxed_slice()) as *mut c_int;
        let kernel = Box::into_raw(Box::new(IplConvKernel {
            n_cols: cols,
            n_rows: rows,
            anchor_x,
            anchor_y,
            values,
            n_shift_r: 0,
        }));
        state.kernels.insert(
            kernel as usize,
            KernelAlloc {
                values: values as usize,
                len,
            },
        );
        kernel
    }

    unsafe fn release_structuring_element(&self, element: *mut *mut IplConvKernel) {
        const ENTRY: &str = "cvReleaseStructuringElement";
        let mut state = self.enter(ENTRY);
        if element.is_null() {
            return state.fail(ENTRY, CV_STS_NULL_PTR);
        }
        let kernel = *element;
        if kernel.is_null() {
            return;
        }
        let Some(alloc) = state.kernels.remove(&(kernel as usize)) else {
            return state.fail(ENTRY, CV_STS_BAD_ARG);
        };
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            alloc.values as *mut c_int,
            alloc.len,
        )));
        drop(Box::from_raw(kernel));
        *element = ptr::null_mut();
    }

    unsafe fn create_camera_capture(&self, index: c_int) -> *mut CvCapture {
        let mut state = self.enter("cvCreateCameraCapture");
        let spec = if index < 0 {
            state.cameras.values().next().copied()
        } else {
            state.cameras.get(&index).copied()
        };
        let Some(spec) = spec else {
            debug!(index, "no such camera");
            return ptr::null_mut();
        };
        match state.open_capture(spec) {
            Ok(capture) => capture,
            Err(status) => {
                state.fail("cvCreateCameraCapture", status);
                ptr::null_mut()
            }
        }
    }

    unsafe fn create_file_capture(&self, filename: *const c_char) -> *mut CvCapture {
        let mut state = self.enter("cvCreateFileCapture");
        if filename.is_null() {
            state.fail("cvCreateFileCapture", CV_STS_NULL_PTR);
            return ptr::null_mut();
        }
        let name = CStr::from_ptr(filename).to_string_lossy();
        let Some(spec) = state.clips.get(name.as_ref()).copied() else {
            debug!(file = %name, "no such clip");
            return ptr::null_mut();
        };
        match state.open_capture(spec) {
            Ok(capture) => capture,
            Err(status) => {
                state.fail("cvCreateFileCapture", status);
                ptr::null_mut()
            }
        }
    }

    unsafe fn query_frame(&self, capture: *mut CvCapture) -> *mut IplImage {
        let mut state = self.enter("cvQueryFrame");
        let Some(source) = state.captures.get_mut(&(capture as usize)) else {
            state.fail("cvQueryFrame", CV_STS_BAD_ARG);
            return ptr::null_mut();
        };
        if source.spec.frames.is_some_and(|frames| source.produced >= frames) {
            return ptr::null_mut();
        }

        let frame = source.frame as *mut IplImage;
        let produced = source.produced as usize;
        source.produced += 1;

        let header = &*frame;
        let channels = header.n_channels as usize;
        let base = header.image_data as *mut u8;
        for y in 0..header.height as usize {
            let row = base.add(y * header.width_step as usize);
            for x in 0..header.width as usize {
                for c in 0..channels {
                    *row.add(x * channels + c) = (x + 2 * y + 16 * produced + 64 * c) as u8;
                }
            }
        }
        frame
    }

    unsafe fn release_capture(&self, capture: *mut *mut CvCapture) {
        let mut state = self.enter("cvReleaseCapture");
        if capture.is_null() {
            return state.fail("cvReleaseCapture", CV_STS_NULL_PTR);
        }
        let source = *capture;
        if source.is_null() {
            return;
        }
        if state.close_capture(source as usize) {
            *capture = ptr::null_mut();
        } else {
            state.fail("cvReleaseCapture", CV_STS_BAD_ARG);
        }
    }

    unsafe fn load_image(&self, filename: *const c_char, iscolor: c_int) -> *mut IplImage {
        let mut state = self.enter("cvLoadImage");
        if filename.is_null() {
            state.fail("cvLoadImage", CV_STS_NULL_PTR);
            return ptr::null_mut();
        }
        let path = CStr::from_ptr(filename).to_string_lossy().into_owned();
        let host = match image::open(&path) {
            Ok(host) => host,
            Err(err) => {
                debug!(path, error = %err, "could not decode image");
                return ptr::null_mut();
            }
        };

        let channels = match iscolor {
            CV_LOAD_IMAGE_GRAYSCALE => 1,
            c if c > 0 => 3,
            _ => convert::channels_for(&host),
        };
        let size = match (c_int::try_from(host.width()), c_int::try_from(host.height())) {
            (Ok(width), Ok(height)) => CvSize { width, height },
            _ => {
                state.fail("cvLoadImage", CV_STS_BAD_SIZE);
                return ptr::null_mut();
            }
        };
        let packed = match convert::pack_host(&host, channels) {
            Ok(packed) => packed,
            Err(_) => {
                state.fail("cvLoadImage", CV_STS_UNSUPPORTED_FORMAT);
                return ptr::null_mut();
            }
        };

        let image = match state.allocate_image(size, IPL_DEPTH_8U, channels, false) {
            Ok(image) => image,
            Err(status) => {
                state.fail("cvLoadImage", status);
                return ptr::null_mut();
            }
        };
        if convert::write_rows(image, &packed).is_err() {
            if let Some(alloc) = state.images.remove(&(image as usize)) {
                State::free_image(image, alloc);
            }
            state.fail("cvLoadImage", CV_STS_ERROR);
            return ptr::null_mut();
        }
        image
    }

    unsafe fn save_image(
        &self,
        filename: *const c_char,
        image: *const CvArr,
        _params: *const c_int,
    ) -> c_int {
        let mut state = self.enter("cvSaveImage");
        if filename.is_null() {
            state.fail("cvSaveImage", CV_STS_NULL_PTR);
            return 0;
        }
        let header = match state.known_image(image as *const IplImage) {
            Ok(header) => header as *const IplImage,
            Err(status) => {
                state.fail("cvSaveImage", status);
                return 0;
            }
        };
        let host = match convert::read_image(header) {
            Ok(host) => host,
            Err(_) => {
                state.fail("cvSaveImage", CV_STS_UNSUPPORTED_FORMAT);
                return 0;
            }
        };

        let path = CStr::from_ptr(filename).to_string_lossy().into_owned();
        match host.save(&path) {
            Ok(()) => 1,
            Err(err) => {
                debug!(path, error = %err, "could not encode image");
                state.fail("cvSaveImage", CV_STS_ERROR);
                0
            }
        }
    }

    unsafe fn named_window(&self, name: *const c_char, flags: c_int) -> c_int {
        let mut state = self.enter("cvNamedWindow");
        if name.is_null() {
            state.fail("cvNamedWindow", CV_STS_NULL_PTR);
            return 0;
        }
        let name = CStr::from_ptr(name).to_string_lossy().into_owned();
        state.windows.entry(name).or_insert(WindowInfo {
            flags,
            ..WindowInfo::default()
        });
        1
    }

    unsafe fn show_image(&self, name: *const c_char, image: *const CvArr) {
        let mut state = self.enter("cvShowImage");
        if name.is_null() {
            return state.fail("cvShowImage", CV_STS_NULL_PTR);
        }
        let view = match state.view(image) {
            Ok(view) => view,
            Err(status) => return state.fail("cvShowImage", status),
        };
        let name = CStr::from_ptr(name).to_string_lossy().into_owned();
        let window = state.windows.entry(name).or_insert(WindowInfo {
            flags: CV_WINDOW_AUTOSIZE,
            ..WindowInfo::default()
        });
        window.frames_shown += 1;
        window.last_size = Some((view.width as i32, view.height as i32));
    }

    unsafe fn wait_key(&self, delay: c_int) -> c_int {
        let mut state = self.enter("cvWaitKey");
        if let Some(key) = state.keys.pop_front() {
            return key;
        }
        drop(state);

        if delay > 0 {
            thread::sleep(Duration::from_millis(delay as u64));
        } else {
            debug!("no scripted key; indefinite wait returns immediately");
        }
        -1
    }

    unsafe fn destroy_window(&self, name: *const c_char) {
        let mut state = self.enter("cvDestroyWindow");
        if name.is_null() {
            return state.fail("cvDestroyWindow", CV_STS_NULL_PTR);
        }
        let name = CStr::from_ptr(name).to_string_lossy();
        state.windows.remove(name.as_ref());
    }

    unsafe fn destroy_all_windows(&self) {
        self.enter("cvDestroyAllWindows").windows.clear();
    }

    unsafe fn copy(&self, src: *const CvArr, dst: *mut CvArr, mask: *const CvArr) {
        let mut state = self.enter("cvCopy");
        if let Err(status) = state.copy(src, dst, mask) {
            state.fail("cvCopy", status);
        }
    }

    unsafe fn convert_scale(&self, src: *const CvArr, dst: *mut CvArr, scale: f64, shift: f64) {
        let mut state = self.enter("cvConvertScale");
        if let Err(status) = state.convert_scale(src, dst, scale, shift) {
            state.fail("cvConvertScale", status);
        }
    }

    unsafe fn and(
        &self,
        src1: *const CvArr,
        src2: *const CvArr,
        dst: *mut CvArr,
        mask: *const CvArr,
    ) {
        let mut state = self.enter("cvAnd");
        if let Err(status) = state.bitwise(src1, src2, dst, mask, |a, b| a & b) {
            state.fail("cvAnd", status);
        }
    }

    unsafe fn or(&self, src1: *const CvArr, src2: *const CvArr, dst: *mut CvArr, mask: *const CvArr) {
        let mut state = self.enter("cvOr");
        if let Err(status) = state.bitwise(src1, src2, dst, mask, |a, b| a | b) {
            state.fail("cvOr", status);
        }
    }

    unsafe fn split(
        &self,
        src: *const CvArr,
        dst0: *mut CvArr,
        dst1: *mut CvArr,
        dst2: *mut CvArr,
        dst3: *mut CvArr,
    ) {
        let mut state = self.enter("cvSplit");
        if let Err(status) = state.split(src, [dst0, dst1, dst2, dst3]) {
            state.fail("cvSplit", status);
        }
    }

    unsafe fn cvt_color(&self, _src: *const CvArr, _dst: *mut CvArr, _code: c_int) {
        self.not_implemented("cvCvtColor");
    }

    unsafe fn threshold(
        &self,
        _src: *const CvArr,
        _dst: *mut CvArr,
        _threshold: f64,
        _max_value: f64,
        _threshold_type: c_int,
    ) -> f64 {
        self.not_implemented("cvThreshold");
        0.0
    }

    unsafe fn pyr_down(&self, _src: *const CvArr, _dst: *mut CvArr, _filter: c_int) {
        self.not_implemented("cvPyrDown");
    }

    unsafe fn pyr_up(&self, _src: *const CvArr, _dst: *mut CvArr, _filter: c_int) {
        self.not_implemented("cvPyrUp");
    }

    unsafe fn dilate(
        &self,
        _src: *const CvArr,
        _dst: *mut CvArr,
        _element: *mut IplConvKernel,
        _iterations: c_int,
    ) {
        self.not_implemented("cvDilate");
    }

    unsafe fn erode(
        &self,
        _src: *const CvArr,
        _dst: *mut CvArr,
        _element: *mut IplConvKernel,
        _iterations: c_int,
    ) {
        self.not_implemented("cvErode");
    }

    unsafe fn morphology_ex(
        &self,
        _src: *const CvArr,
        _dst: *mut CvArr,
        _temp: *mut CvArr,
        _element: *mut IplConvKernel,
        _operation: c_int,
        _iterations: c_int,
    ) {
        self.not_implemented("cvMorphologyEx");
    }

    unsafe fn poly_line(
        &self,
        _img: *mut CvArr,
        _pts: *mut *mut CvPoint,
        _npts: *const c_int,
        _contours: c_int,
        _is_closed: c_int,
        _color: CvScalar,
        _thickness: c_int,
        _line_type: c_int,
        _shift: c_int,
    ) {
        self.not_implemented("cvPolyLine");
    }

    unsafe fn line(
        &self,
        _img: *mut CvArr,
        _pt1: CvPoint,
        _pt2: CvPoint,
        _color: CvScalar,
        _thickness: c_int,
        _line_type: c_int,
        _shift: c_int,
    ) {
        self.not_implemented("cvLine");
    }

    unsafe fn rectangle(
        &self,
        _img: *mut CvArr,
        _pt1: CvPoint,
        _pt2: CvPoint,
        _color: CvScalar,
        _thickness: c_int,
        _line_type: c_int,
        _shift: c_int,
    ) {
        self.not_implemented("cvRectangle");
    }

    unsafe fn circle(
        &self,
        _img: *mut CvArr,
        _center: CvPoint,
        _radius: c_int,
        _color: CvScalar,
        _thickness: c_int,
        _line_type: c_int,
        _shift: c_int,
    ) {
        self.not_implemented("cvCircle");
    }

    unsafe fn find_contours(
        &self,
        _image: *mut CvArr,
        _storage: *mut CvMemStorage,
        first_contour: *mut *mut CvSeq,
        _header_size: c_int,
        _mode: c_int,
        _method: c_int,
        _offset: CvPoint,
    ) -> c_int {
        if !first_contour.is_null() {
            *first_contour = ptr::null_mut();
        }
        self.not_implemented("cvFindContours");
        CV_STS_NOT_IMPLEMENTED
    }

    unsafe fn approx_poly(
        &self,
        _src_seq: *const c_void,
        _header_size: c_int,
        _storage: *mut CvMemStorage,
        _method: c_int,
        _eps: f64,
        _recursive: c_int,
    ) -> *mut CvSeq {
        self.not_implemented("cvApproxPoly");
        ptr::null_mut()
    }

    unsafe fn contour_area(&self, _contour: *const CvArr, _slice: CvSlice, _oriented: c_int) -> f64 {
        self.not_implemented("cvContourArea");
        0.0
    }

    unsafe fn arc_length(&self, _curve: *const c_void, _slice: CvSlice, _is_closed: c_int) -> f64 {
        self.not_implemented("cvArcLength");
        0.0
    }

    unsafe fn check_contour_convexity(&self, _contour: *const CvArr) -> c_int {
        self.not_implemented("cvCheckContourConvexity");
        0
    }
}
