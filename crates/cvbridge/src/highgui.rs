//! Windows, keyboard input and image files.

use std::ffi::CString;
use std::path::Path;
use std::time::Duration;

use cvbridge_ffi_common::{cstring_from_path, cstring_from_str, duration_to_millis, from_c_bool};
use tracing::{debug, error};

use crate::arr::Arr;
use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::handle::ImageKind;
use crate::image::Image;
use crate::sys::{
    CV_LOAD_IMAGE_COLOR, CV_LOAD_IMAGE_GRAYSCALE, CV_LOAD_IMAGE_UNCHANGED, CV_STS_ERROR,
    CV_WINDOW_AUTOSIZE, CV_WINDOW_NORMAL,
};

/// Window creation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFlags {
    /// User-resizable
    Normal,
    /// Sized to the image shown
    #[default]
    AutoSize,
}

impl WindowFlags {
    pub fn raw(self) -> i32 {
        match self {
            WindowFlags::Normal => CV_WINDOW_NORMAL,
            WindowFlags::AutoSize => CV_WINDOW_AUTOSIZE,
        }
    }
}

/// Channel handling for [`load_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Keep the file's channels
    Unchanged,
    Grayscale,
    /// Three-channel BGR
    #[default]
    Color,
}

impl LoadMode {
    pub fn raw(self) -> i32 {
        match self {
            LoadMode::Unchanged => CV_LOAD_IMAGE_UNCHANGED,
            LoadMode::Grayscale => CV_LOAD_IMAGE_GRAYSCALE,
            LoadMode::Color => CV_LOAD_IMAGE_COLOR,
        }
    }
}

/// A named window, destroyed on drop.
#[derive(Debug)]
pub struct Window {
    name: String,
    cname: CString,
    bridge: Bridge,
    open: bool,
}

impl Window {
    /// `cvNamedWindow`; opening an existing name reuses that window
    pub fn new(bridge: &Bridge, name: &str, flags: WindowFlags) -> Result<Self> {
        let cname = cstring_from_str(name)?;
        let raw_name = cname.clone();
        let flags = flags.raw();
        let created = bridge.run("cvNamedWindow", move |api| unsafe {
            api.named_window(raw_name.as_ptr(), flags)
        })?;
        if !from_c_bool(created) {
            return Err(Error::AllocationFailed {
                kind: "window",
                operation: "cvNamedWindow",
                status: None,
            });
        }
        debug!(window = name, "opened window");
        Ok(Self {
            name: name.to_string(),
            cname,
            bridge: bridge.clone(),
            open: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `cvShowImage`
    pub fn show(&self, image: &impl Arr) -> Result<()> {
        let name = self.cname.clone();
        let arr = image.arr_ptr();
        self.bridge.run("cvShowImage", move |api| unsafe {
            api.show_image(name.as_ptr(), arr.as_ptr())
        })
    }

    /// `cvDestroyWindow`
    pub fn destroy(mut self) -> Result<()> {
        self.open = false;
        destroy_window(&self.bridge, self.cname.clone())
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Err(e) = destroy_window(&self.bridge, self.cname.clone()) {
            error!(window = %self.name, error = %e, "failed to destroy window");
        }
    }
}

fn destroy_window(bridge: &Bridge, name: CString) -> Result<()> {
    bridge.run("cvDestroyWindow", move |api| unsafe { api.destroy_window(name.as_ptr()) })
}

/// `cvWaitKey`: the key pressed within `delay`, or `None`.
///
/// A zero delay waits until a key is pressed. Only windows created through
/// the bridge receive events, and only while this call runs.
pub fn wait_key(bridge: &Bridge, delay: Duration) -> Result<Option<i32>> {
    let delay = duration_to_millis(delay);
    let key = bridge.run("cvWaitKey", move |api| unsafe { api.wait_key(delay) })?;
    Ok((key != -1).then_some(key))
}

/// `cvDestroyAllWindows`
pub fn destroy_all_windows(bridge: &Bridge) -> Result<()> {
    bridge.run("cvDestroyAllWindows", |api| unsafe { api.destroy_all_windows() })
}

/// `cvLoadImage`
pub fn load_image(bridge: &Bridge, path: impl AsRef<Path>, mode: LoadMode) -> Result<Image> {
    let name = cstring_from_path(path.as_ref())?;
    let mode = mode.raw();
    let handle = bridge.create::<ImageKind, _>("cvLoadImage", move |api| unsafe {
        api.load_image(name.as_ptr(), mode)
    })?;
    Ok(Image::from_handle(handle))
}

/// `cvSaveImage`; the format follows the file extension
pub fn save_image(path: impl AsRef<Path>, image: &impl Arr) -> Result<()> {
    let name = cstring_from_path(path.as_ref())?;
    let arr = image.arr_ptr();
    let written = image.bridge().run("cvSaveImage", move |api| unsafe {
        api.save_image(name.as_ptr(), arr.as_ptr(), std::ptr::null())
    })?;
    if !from_c_bool(written) {
        return Err(Error::OperationFailed {
            operation: "cvSaveImage",
            code: CV_STS_ERROR,
            message: format!("could not write {}", path.as_ref().display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(WindowFlags::default().raw(), 1);
        assert_eq!(WindowFlags::Normal.raw(), 0);
        assert_eq!(LoadMode::Unchanged.raw(), -1);
        assert_eq!(LoadMode::Grayscale.raw(), 0);
        assert_eq!(LoadMode::default().raw(), 1);
    }
}
