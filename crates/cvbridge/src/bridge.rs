//! The bridge: native calls routed through the executor
//!
//! Every native call goes through [`Bridge::run`], which executes a closure
//! on the pinned thread with the native entry-point table and then checks
//! the native error status. The handle factories build on it:
//!
//! - [`Bridge::create`]: a native create call, result tagged `Owned`
//! - [`Bridge::borrow`]: a pointer lent by the library, tagged `Borrowed`
//! - [`Bridge::from_pool`]: an object carved from a storage, tagged `Pooled`
//!
//! Closures receive `&dyn NativeApi` and must return `Send` values, so raw
//! pointers travel back as [`NativePtr`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use cvbridge_executor::{Executor, Pump};
use cvbridge_ffi_common::{cstr_to_string_lossy, NativePtr};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, NativeStatus, Result};
use crate::handle::{Handle, NativeKind, Ownership, StorageKind};
use crate::native::NativeApi;
use crate::sys::{CvMemStorage, CV_ERR_MODE_SILENT, CV_STS_OK};

/// Cloneable access to the native library through the executor.
#[derive(Clone)]
pub struct Bridge {
    executor: Executor,
    api: Arc<dyn NativeApi>,
    silence_native_errors: bool,
    storage_block_size: i32,
    init: Arc<Once>,
}

impl Bridge {
    /// Wrap an existing executor with default settings
    pub fn new(executor: Executor, api: Arc<dyn NativeApi>) -> Self {
        let defaults = BridgeConfig::default();
        Self {
            executor,
            api,
            silence_native_errors: defaults.silence_native_errors,
            storage_block_size: defaults.storage_block_size,
            init: Arc::new(Once::new()),
        }
    }

    /// Build the executor and bridge. The returned pump must be driven by
    /// the thread that is to own the native library.
    pub fn start(config: BridgeConfig, api: Arc<dyn NativeApi>) -> (Bridge, Pump) {
        let (executor, pump) = Executor::new(config.executor);
        info!(
            executor = executor.name(),
            provider = api.name(),
            "native bridge created"
        );
        let bridge = Self {
            executor,
            api,
            silence_native_errors: config.silence_native_errors,
            storage_block_size: config.storage_block_size,
            init: Arc::new(Once::new()),
        };
        (bridge, pump)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Native provider name
    pub fn provider(&self) -> &'static str {
        self.api.name()
    }

    pub fn storage_block_size(&self) -> i32 {
        self.storage_block_size
    }

    /// Run `f` on the pinned thread and check the native error status.
    ///
    /// A negative status after `f` returns is reset and reported as
    /// [`Error::OperationFailed`] tagged with `operation`.
    pub fn run<F, R>(&self, operation: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&dyn NativeApi) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (value, status) = self.call(f)?;
        match status {
            Some(status) => {
                warn!(operation, code = status.code, message = %status.message, "native call failed");
                Err(status.into_error(operation))
            }
            None => Ok(value),
        }
    }

    /// Run `f` on the pinned thread and return its value with the native
    /// error status it left behind.
    ///
    /// The status is cleared before `f` runs and reset afterwards, also
    /// when `f` panics.
    fn call<F, R>(&self, f: F) -> Result<(R, Option<NativeStatus>)>
    where
        F: FnOnce(&dyn NativeApi) -> R + Send + 'static,
        R: Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let init = Arc::clone(&self.init);
        let silence = self.silence_native_errors;

        let outcome = self.executor.run(move || {
            let api = &*api;
            init.call_once(|| {
                if silence {
                    unsafe { api.set_err_mode(CV_ERR_MODE_SILENT) };
                }
            });

            unsafe { api.set_err_status(CV_STS_OK) };
            let value = match panic::catch_unwind(AssertUnwindSafe(|| f(api))) {
                Ok(value) => value,
                Err(payload) => {
                    unsafe { api.set_err_status(CV_STS_OK) };
                    panic::resume_unwind(payload);
                }
            };
            (value, take_status(api))
        })?;
        Ok(outcome)
    }

    /// Run a native create call and take ownership of the result.
    ///
    /// A null result is [`Error::AllocationFailed`], carrying the native
    /// status if one was set. An object returned together with a negative
    /// status is released before the status is reported.
    pub fn create<K, F>(&self, operation: &'static str, f: F) -> Result<Handle<K>>
    where
        K: NativeKind,
        F: FnOnce(&dyn NativeApi) -> *mut K::Raw + Send + 'static,
    {
        let (ptr, status) = self.call(move |api| NativePtr::new(f(api)))?;
        if ptr.is_null() {
            return Err(self.allocation_failed(K::NAME, operation, status));
        }
        let handle = Handle::new(self.clone(), ptr, Ownership::Owned);
        if let Some(status) = status {
            warn!(kind = K::NAME, operation, code = status.code, "create reported failure, releasing result");
            if let Err(err) = handle.release() {
                warn!(kind = K::NAME, operation, error = %err, "release after failed create");
            }
            return Err(status.into_error(operation));
        }
        debug!(kind = K::NAME, operation, addr = ptr.addr(), "created native object");
        Ok(handle)
    }

    /// Run a native call that lends out an object; null means "none".
    pub fn borrow<K, F>(&self, operation: &'static str, f: F) -> Result<Option<Handle<K>>>
    where
        K: NativeKind,
        F: FnOnce(&dyn NativeApi) -> *mut K::Raw + Send + 'static,
    {
        let ptr = self.run(operation, move |api| NativePtr::new(f(api)))?;
        Ok((!ptr.is_null()).then(|| Handle::new(self.clone(), ptr, Ownership::Borrowed)))
    }

    /// Run a native call that allocates from `storage`.
    ///
    /// Null is [`Error::AllocationFailed`]. A pooled object returned with a
    /// negative status stays with its storage.
    pub fn from_pool<K, F>(
        &self,
        storage: &Handle<StorageKind>,
        operation: &'static str,
        f: F,
    ) -> Result<Handle<K>>
    where
        K: NativeKind,
        F: FnOnce(&dyn NativeApi, *mut CvMemStorage) -> *mut K::Raw + Send + 'static,
    {
        let pool = storage.as_raw();
        let (ptr, status) = self.call(move |api| NativePtr::new(f(api, pool.as_ptr())))?;
        if ptr.is_null() {
            return Err(self.allocation_failed(K::NAME, operation, status));
        }
        if let Some(status) = status {
            warn!(kind = K::NAME, operation, code = status.code, "pooled create failed");
            return Err(status.into_error(operation));
        }
        Ok(Handle::new(self.clone(), ptr, Ownership::Pooled))
    }

    fn allocation_failed(
        &self,
        kind: &'static str,
        operation: &'static str,
        status: Option<NativeStatus>,
    ) -> Error {
        match &status {
            Some(status) => warn!(kind, operation, code = status.code, message = %status.message, "allocation failed"),
            None => debug!(kind, operation, "native library returned null"),
        }
        Error::AllocationFailed {
            kind,
            operation,
            status,
        }
    }

    /// Free one owned object of kind `K`.
    pub(crate) fn release_raw<K: NativeKind>(&self, ptr: NativePtr<K::Raw>) -> Result<()> {
        self.run(K::RELEASE, move |api| unsafe { K::release(api, ptr.as_ptr()) })
    }
}

/// Read and reset a negative native error status.
fn take_status(api: &dyn NativeApi) -> Option<NativeStatus> {
    let code = unsafe { api.get_err_status() };
    if code >= 0 {
        return None;
    }
    unsafe {
        api.set_err_status(CV_STS_OK);
        let message = cstr_to_string_lossy(api.error_str(code));
        Some(NativeStatus { code, message })
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("executor", &self.executor)
            .field("provider", &self.api.name())
            .finish()
    }
}
