use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::LockBroker;
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

#[cfg(windows)]
mod sys {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::ptr::null;
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, WAIT_ABANDONED, WAIT_OBJECT_0, WAIT_TIMEOUT};
    use windows_sys::Win32::System::Threading::{CreateMutexW, ReleaseMutex, WaitForSingleObject};

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    /// Opens (creating if missing) `Local\…`, falling back to `Global\…` if
    /// the local namespace is denied — e.g. running under a service session
    /// that cannot see a console session's `Local\` objects.
    pub fn open(resource: Resource) -> Result<HANDLE> {
        for name in [resource.local_name(), resource.global_name()] {
            let wide_name = wide(name);
            // SAFETY: wide_name is NUL-terminated UTF-16; bInitialOwner=FALSE
            // so we never race to take ownership implicitly on creation.
            let handle = unsafe { CreateMutexW(null(), 0, wide_name.as_ptr()) };
            if !handle.is_null() {
                return Ok(handle);
            }
            tracing::debug!(name, error = unsafe { GetLastError() }, "CreateMutexW failed, trying fallback namespace");
        }
        Err(Error::MutexUnavailable)
    }

    pub fn wait(handle: HANDLE, wait_ms: u32) -> Result<()> {
        // SAFETY: handle came from a successful CreateMutexW and stays valid
        // for the lifetime of the broker that owns it.
        match unsafe { WaitForSingleObject(handle, wait_ms) } {
            WAIT_OBJECT_0 => Ok(()),
            WAIT_ABANDONED => {
                tracing::warn!("acquired mutex abandoned by a terminated owner");
                Ok(())
            }
            WAIT_TIMEOUT => Err(Error::AcquireTimeout),
            _ => Err(Error::MutexUnavailable),
        }
    }

    pub fn release(handle: HANDLE) {
        // SAFETY: only called once per successful acquisition, from the
        // thread that acquired it, per Win32 mutex release semantics.
        unsafe {
            ReleaseMutex(handle);
        }
    }

    pub fn close(handle: HANDLE) {
        unsafe {
            CloseHandle(handle);
        }
    }
}

#[cfg(not(windows))]
mod sys {
    use super::*;

    pub type Handle = ();

    pub fn open(_resource: Resource) -> Result<Handle> {
        Err(Error::MutexUnavailable)
    }
    pub fn wait(_handle: Handle, _wait_ms: u32) -> Result<()> {
        Err(Error::MutexUnavailable)
    }
    pub fn release(_handle: Handle) {}
    pub fn close(_handle: Handle) {}
}

#[cfg(windows)]
type RawHandle = windows_sys::Win32::Foundation::HANDLE;
#[cfg(not(windows))]
type RawHandle = ();

struct OwnedHandle(RawHandle);
// SAFETY: the handle is only ever touched through `sys::wait`/`release`,
// which are safe to call from any thread against an open mutex handle.
unsafe impl Send for OwnedHandle {}
unsafe impl Sync for OwnedHandle {}

/// Real broker backed by named Win32 mutexes. Lazily opens each resource on
/// first use and keeps the handle for the process lifetime.
pub struct MutexBroker {
    handles: StdMutex<HashMap<Resource, OwnedHandle>>,
}

impl Default for MutexBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MutexBroker {
    pub fn new() -> Self {
        Self {
            handles: StdMutex::new(HashMap::new()),
        }
    }

    fn handle_for(&self, which: Resource) -> Result<RawHandle> {
        let mut map = self.handles.lock().expect("mutex broker map poisoned");
        if let Some(h) = map.get(&which) {
            return Ok(h.0);
        }
        let h = sys::open(which)?;
        map.insert(which, OwnedHandle(h));
        Ok(h)
    }
}

impl Drop for MutexBroker {
    fn drop(&mut self) {
        if let Ok(map) = self.handles.lock() {
            for h in map.values() {
                sys::close(h.0);
            }
        }
    }
}

impl LockBroker for MutexBroker {
    fn with_lock<T, E: From<Error>>(
        &self,
        which: Resource,
        wait: Duration,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let handle = self.handle_for(which)?;
        sys::wait(handle, wait.as_millis().min(u32::MAX as u128) as u32)?;
        // Release on every exit path, including an `f` that panics: the
        // guard's Drop runs during unwinding before the panic propagates.
        struct ReleaseGuard(RawHandle);
        impl Drop for ReleaseGuard {
            fn drop(&mut self) {
                sys::release(self.0);
            }
        }
        let _guard = ReleaseGuard(handle);
        f()
    }
}
