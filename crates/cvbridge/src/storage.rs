//! Memory storages and the sequences carved from them.
//!
//! A [`MemStorage`] is a native bump allocator. Sequences created in it,
//! including contour lists, are pool-owned: they have no release of their
//! own and disappear when the storage is cleared or released. [`Seq<'s>`]
//! borrows its storage, so clearing or releasing the storage while a
//! sequence is alive is rejected by the borrow checker.

use std::marker::PhantomData;
use std::mem::size_of;
use std::os::raw::c_void;

use cvbridge_ffi_common::NativePtr;

use crate::arr::Arr;
use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::handle::{Handle, SeqKind, StorageKind};
use crate::image;
use crate::sys::{CvArr, CvPoint, CvSeq, CV_SEQ_ELTYPE_POINT, CV_SEQ_POLYGON};
use crate::types::{Point, Size};

/// An owned native memory storage.
#[derive(Debug)]
pub struct MemStorage {
    handle: Handle<StorageKind>,
}

impl MemStorage {
    /// A storage with the bridge's configured block size
    pub fn new(bridge: &Bridge) -> Result<Self> {
        Self::with_block_size(bridge, bridge.storage_block_size())
    }

    /// `cvCreateMemStorage`; zero selects the native default
    pub fn with_block_size(bridge: &Bridge, block_size: i32) -> Result<Self> {
        if block_size < 0 {
            return Err(Error::InvalidArgument(format!(
                "block size must not be negative, got {block_size}"
            )));
        }
        let handle = bridge.create::<StorageKind, _>("cvCreateMemStorage", move |api| unsafe {
            api.create_mem_storage(block_size)
        })?;
        Ok(Self { handle })
    }

    pub fn handle(&self) -> &Handle<StorageKind> {
        &self.handle
    }

    pub fn bridge(&self) -> &Bridge {
        self.handle.bridge()
    }

    /// `cvClearMemStorage`: drop every sequence and keep the storage
    pub fn clear(&mut self) -> Result<()> {
        let ptr = self.handle.as_raw();
        self.bridge()
            .run("cvClearMemStorage", move |api| unsafe { api.clear_mem_storage(ptr.as_ptr()) })
    }

    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

/// A pool-owned sequence living in a [`MemStorage`].
#[derive(Debug)]
pub struct Seq<'s> {
    handle: Handle<SeqKind>,
    _storage: PhantomData<&'s MemStorage>,
}

impl<'s> Seq<'s> {
    /// `cvCreateSeq` with a plain `CvSeq` header
    pub fn new(storage: &'s MemStorage, flags: i32, elem_size: usize) -> Result<Self> {
        if elem_size == 0 {
            return Err(Error::InvalidArgument("element size must be positive".into()));
        }
        let handle = storage.bridge().from_pool::<SeqKind, _>(
            storage.handle(),
            "cvCreateSeq",
            move |api, pool| unsafe { api.create_seq(flags, size_of::<CvSeq>(), elem_size, pool) },
        )?;
        Ok(Self::from_handle(handle))
    }

    /// An open sequence of points
    pub fn of_points(storage: &'s MemStorage) -> Result<Self> {
        Self::new(storage, CV_SEQ_ELTYPE_POINT, size_of::<CvPoint>())
    }

    /// A closed polygon
    pub fn polygon(storage: &'s MemStorage) -> Result<Self> {
        Self::new(storage, CV_SEQ_POLYGON, size_of::<CvPoint>())
    }

    pub(crate) fn from_handle(handle: Handle<SeqKind>) -> Self {
        Self {
            handle,
            _storage: PhantomData,
        }
    }

    pub fn handle(&self) -> &Handle<SeqKind> {
        &self.handle
    }

    fn header<F, R>(&self, operation: &'static str, read: F) -> Result<R>
    where
        F: FnOnce(&CvSeq) -> R + Send + 'static,
        R: Send + 'static,
    {
        let ptr = self.handle.as_raw();
        self.bridge()
            .run(operation, move |_api| unsafe { read(&*ptr.as_ptr()) })
    }

    /// Number of elements
    pub fn len(&self) -> Result<usize> {
        self.header("read sequence header", |seq| seq.total.max(0) as usize)
    }

    /// `cvGetSize` on the sequence: `total` columns by one row
    pub fn size(&self) -> Result<Size> {
        image::read_size(self.bridge(), self.arr_ptr())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn elem_size(&self) -> Result<usize> {
        self.header("read sequence header", |seq| seq.elem_size.max(0) as usize)
    }

    /// `cvSeqPush` with raw element bytes
    pub fn push_bytes(&mut self, element: &[u8]) -> Result<()> {
        let expected = self.elem_size()?;
        if element.len() != expected {
            return Err(Error::ElementSize {
                expected,
                actual: element.len(),
            });
        }
        let ptr = self.handle.as_raw();
        let element = element.to_vec();
        let slot = self.bridge().run("cvSeqPush", move |api| unsafe {
            NativePtr::new(api.seq_push(ptr.as_ptr(), element.as_ptr() as *const c_void))
        })?;
        if slot.is_null() {
            return Err(Error::AllocationFailed {
                kind: "sequence element",
                operation: "cvSeqPush",
                status: None,
            });
        }
        Ok(())
    }

    pub fn push_point(&mut self, point: Point) -> Result<()> {
        let point = CvPoint::from(point);
        let bytes = [point.x.to_ne_bytes(), point.y.to_ne_bytes()].concat();
        self.push_bytes(&bytes)
    }

    /// Copy of the element bytes at `index`
    pub fn element_at(&self, index: usize) -> Result<Vec<u8>> {
        let len = self.len()?;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let ptr = self.handle.as_raw();
        let index = index as i32;
        let bytes = self.bridge().run("cvGetSeqElem", move |api| unsafe {
            let seq = ptr.as_ptr();
            let element = api.get_seq_elem(seq, index);
            (!element.is_null()).then(|| {
                std::slice::from_raw_parts(element as *const u8, (*seq).elem_size as usize).to_vec()
            })
        })?;
        bytes.ok_or(Error::IndexOutOfBounds { index: index as usize, len })
    }

    /// Element at `index` read as a point
    pub fn point_at(&self, index: usize) -> Result<Point> {
        let bytes = self.element_at(index)?;
        if bytes.len() != size_of::<CvPoint>() {
            return Err(Error::ElementSize {
                expected: size_of::<CvPoint>(),
                actual: bytes.len(),
            });
        }
        let x = i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let y = i32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Point::new(x, y))
    }

    /// Every element read as a point
    pub fn points(&self) -> Result<Vec<Point>> {
        (0..self.len()?).map(|i| self.point_at(i)).collect()
    }

    /// Next sequence at the same level (`h_next`), e.g. the next contour
    pub fn next(&self) -> Result<Option<Seq<'s>>> {
        let link = self.header("read sequence links", |seq| NativePtr::new(seq.h_next))?;
        Ok(self.linked(link))
    }

    /// Previous sequence at the same level (`h_prev`)
    pub fn prev(&self) -> Result<Option<Seq<'s>>> {
        let link = self.header("read sequence links", |seq| NativePtr::new(seq.h_prev))?;
        Ok(self.linked(link))
    }

    fn linked(&self, link: NativePtr<CvSeq>) -> Option<Seq<'s>> {
        (!link.is_null()).then(|| {
            let ownership = self.handle.ownership();
            Seq::from_handle(Handle::new(self.bridge().clone(), link, ownership))
        })
    }

    /// No-op: the storage frees the sequence
    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

impl Arr for Seq<'_> {
    fn bridge(&self) -> &Bridge {
        self.handle.bridge()
    }

    fn arr_ptr(&self) -> NativePtr<CvArr> {
        self.handle.as_raw().cast()
    }
}
