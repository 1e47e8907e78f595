//! COM lifetime helpers shared by the WASAPI objects.

use std::ffi::c_void;
use std::marker::PhantomData;

use windows::Win32::System::Com::{
    CoInitializeEx, CoTaskMemFree, CoUninitialize, COINIT_MULTITHREADED, COINIT_SPEED_OVER_MEMORY,
};

use loopback_sink_core::PlatformError;

/// Per-thread COM initialization, balanced on drop.
///
/// Every structure holding COM objects owns one, declared as its last field
/// so the objects are released before COM is torn down.
pub struct ComGuard {
    initialized: bool,
    // COM apartments are per thread.
    _not_send: PhantomData<*const ()>,
}

impl ComGuard {
    pub fn new() -> Self {
        let status = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED | COINIT_SPEED_OVER_MEMORY) };
        if status.is_err() {
            // RPC_E_CHANGED_MODE leaves the thread in its existing apartment.
            log::warn!("CoInitializeEx failed [0x{:08X}]", status.0 as u32);
        }

        Self {
            initialized: status.is_ok(),
            _not_send: PhantomData,
        }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

/// Owns a buffer allocated by COM with `CoTaskMemAlloc`.
pub struct CoTaskMem<T>(*mut T);

impl<T> CoTaskMem<T> {
    /// # Safety
    ///
    /// `ptr` must be null or a `CoTaskMemAlloc` allocation nobody else frees.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> *const T {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl<T> Drop for CoTaskMem<T> {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CoTaskMemFree(Some(self.0 as *const c_void)) };
        }
    }
}

pub fn platform_error(error: windows::core::Error, context: &str) -> PlatformError {
    PlatformError::new(error.code().0, context)
}
