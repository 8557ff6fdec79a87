//! Common FFI marshalling utilities for cvbridge.
//!
//! Shared helpers for moving values across the C boundary of the native
//! vision library: pointer carriers that may cross threads, C string
//! conversion for window names and file paths, and the integer encodings the
//! C API uses for booleans and delays.
//!
//! # Memory Ownership
//!
//! - Nothing here frees native memory; release discipline lives with handles
//! - `CString` values returned here are owned by the caller and must outlive
//!   every native call that receives their pointer
//! - Pointers read with `cstr_to_*` are borrowed and never freed

use std::ffi::{CStr, CString, NulError};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use std::time::Duration;

/// A raw pointer that may be moved between threads.
///
/// Native objects are only ever dereferenced on the pinned thread; every
/// other thread merely carries their address. This wrapper makes that
/// carrying possible without asserting anything about the pointee.
///
/// Always read the pointer with [`NativePtr::as_ptr`] inside closures: a
/// closure that names the inner field captures the bare `*mut T`, which is
/// not `Send`.
#[repr(transparent)]
pub struct NativePtr<T>(*mut T);

// SAFETY: the pointer is an opaque address on every thread except the pinned
// one, which is the only place it is dereferenced.
unsafe impl<T> Send for NativePtr<T> {}
unsafe impl<T> Sync for NativePtr<T> {}

impl<T> NativePtr<T> {
    /// Wrap a raw pointer (may be null)
    #[inline]
    pub const fn new(ptr: *mut T) -> Self {
        Self(ptr)
    }

    /// A null pointer
    #[inline]
    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    /// The wrapped pointer
    #[inline]
    pub const fn as_ptr(&self) -> *mut T {
        self.0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Reinterpret as a pointer to another type
    #[inline]
    pub const fn cast<U>(&self) -> NativePtr<U> {
        NativePtr(self.0 as *mut U)
    }

    /// The address as an integer, for logging and bookkeeping
    #[inline]
    pub fn addr(&self) -> usize {
        self.0 as usize
    }
}

impl<T> Clone for NativePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativePtr<T> {}

impl<T> PartialEq for NativePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl<T> Eq for NativePtr<T> {}

impl<T> fmt::Debug for NativePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePtr({:p})", self.0)
    }
}

/// Convert a Rust string into an owned C string.
///
/// Fails if the input contains an interior null byte.
#[inline]
pub fn cstring_from_str(s: &str) -> Result<CString, NulError> {
    CString::new(s)
}

/// Convert a path into an owned C string using the platform byte encoding.
///
/// Fails if the path contains an interior null byte.
pub fn cstring_from_path(path: &Path) -> Result<CString, NulError> {
    CString::new(path.as_os_str().as_encoded_bytes())
}

/// Convert a C string pointer to an owned Rust string, replacing invalid
/// UTF-8. Returns an empty string for null.
///
/// # Safety
/// The pointer must be valid and null-terminated, or null.
pub unsafe fn cstr_to_string_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Encode a boolean as the C API expects (0 or 1)
#[inline]
pub fn to_c_bool(value: bool) -> c_int {
    c_int::from(value)
}

/// Decode a C boolean (any non-zero value is true)
#[inline]
pub fn from_c_bool(value: c_int) -> bool {
    value != 0
}

/// Whole milliseconds in `delay`, saturating at `c_int::MAX`.
#[inline]
pub fn duration_to_millis(delay: Duration) -> c_int {
    c_int::try_from(delay.as_millis()).unwrap_or(c_int::MAX)
}

/// Build the pointer table and length table for a C "array of arrays"
/// parameter (`T** arrays, int* lengths, int count`).
///
/// The returned pointers borrow from `arrays`, which must stay alive and
/// unmoved for as long as the tables are in use. Empty inner arrays yield
/// null entries.
pub fn array_table<T>(arrays: &mut [Vec<T>]) -> (Vec<*mut T>, Vec<c_int>) {
    let mut pointers = Vec::with_capacity(arrays.len());
    let mut lengths = Vec::with_capacity(arrays.len());

    for inner in arrays.iter_mut() {
        pointers.push(if inner.is_empty() {
            ptr::null_mut()
        } else {
            inner.as_mut_ptr()
        });
        lengths.push(c_int::try_from(inner.len()).unwrap_or(c_int::MAX));
    }

    (pointers, lengths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_ptr_null_and_cast() {
        let p: NativePtr<u32> = NativePtr::null();
        assert!(p.is_null());
        assert!(p.cast::<u8>().is_null());

        let mut value = 5u32;
        let p = NativePtr::new(&mut value as *mut u32);
        assert!(!p.is_null());
        assert_eq!(p.addr(), &value as *const u32 as usize);
        assert_eq!(p, p.clone());
    }

    #[test]
    fn test_native_ptr_is_send() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<NativePtr<std::ffi::c_void>>();
    }

    #[test]
    fn test_cstring_from_str_rejects_interior_null() {
        assert!(cstring_from_str("window").is_ok());
        assert!(cstring_from_str("win\0dow").is_err());
    }

    #[test]
    fn test_cstring_from_path() {
        let c = cstring_from_path(Path::new("frames/0001.png")).unwrap();
        assert_eq!(c.to_str().unwrap(), "frames/0001.png");
    }

    #[test]
    fn test_cstr_to_string_lossy() {
        let s = CString::new(vec![b'o', b'k', 0xff]).unwrap();
        let result = unsafe { cstr_to_string_lossy(s.as_ptr()) };
        assert_eq!(result, "ok\u{fffd}");
        assert_eq!(unsafe { cstr_to_string_lossy(ptr::null()) }, "");
    }

    #[test]
    fn test_c_bool_round_trip() {
        assert_eq!(to_c_bool(true), 1);
        assert_eq!(to_c_bool(false), 0);
        assert!(from_c_bool(-1));
        assert!(!from_c_bool(0));
    }

    #[test]
    fn test_duration_to_millis() {
        assert_eq!(duration_to_millis(Duration::from_micros(1500)), 1);
        assert_eq!(duration_to_millis(Duration::from_secs(2)), 2000);
        assert_eq!(duration_to_millis(Duration::from_secs(u64::MAX)), c_int::MAX);
    }

    #[test]
    fn test_array_table() {
        let mut arrays = vec![vec![1i32, 2, 3], vec![], vec![4]];
        let (pointers, lengths) = array_table(&mut arrays);

        assert_eq!(lengths, vec![3, 0, 1]);
        assert!(pointers[1].is_null());
        assert_eq!(unsafe { *pointers[0].add(2) }, 3);
        assert_eq!(unsafe { *pointers[2] }, 4);
    }
}
