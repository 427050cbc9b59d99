// Native Library Resolver
// Finds relocated native libraries and opens them through the host primitive

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use stow_probe::Layout;

use crate::error::LoadError;

/// Opaque handle returned by the platform's native-open call.
///
/// Handles are owned by the host process and never closed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(NonNull<c_void>);

// The handle is an address the OS loader hands out; it is valid on any thread.
unsafe impl Send for NativeHandle {}
unsafe impl Sync for NativeHandle {}

impl NativeHandle {
    /// Wrap a raw handle, `None` for null
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(NativeHandle)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// The host's native-open primitive
pub trait NativeOpener: Send + Sync {
    /// Open the library at `path`. A bare name goes through the platform's default search.
    fn open(&self, path: &Path) -> Result<NativeHandle, LoadError>;
}

/// Opens libraries with `dlopen` (Unix) or `LoadLibraryW` (Windows)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

#[cfg(unix)]
impl NativeOpener for SystemOpener {
    fn open(&self, path: &Path) -> Result<NativeHandle, LoadError> {
        use std::ffi::{CStr, CString};
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| LoadError::NativeOpen {
            path: path.to_path_buf(),
            reason: "path contains an interior NUL byte".to_string(),
        })?;

        let raw = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };

        NativeHandle::from_raw(raw).ok_or_else(|| {
            let message = unsafe { libc::dlerror() };
            let reason = if message.is_null() {
                "unknown dlopen error".to_string()
            } else {
                unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned()
            };
            LoadError::NativeOpen {
                path: path.to_path_buf(),
                reason,
            }
        })
    }
}

#[cfg(windows)]
impl NativeOpener for SystemOpener {
    fn open(&self, path: &Path) -> Result<NativeHandle, LoadError> {
        use std::iter::once;
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::errhandlingapi::GetLastError;
        use winapi::um::libloaderapi::LoadLibraryW;

        let wide: Vec<u16> = path.as_os_str().encode_wide().chain(once(0)).collect();
        let raw = unsafe { LoadLibraryW(wide.as_ptr()) };

        NativeHandle::from_raw(raw as *mut c_void).ok_or_else(|| LoadError::NativeOpen {
            path: path.to_path_buf(),
            reason: format!("LoadLibraryW failed with error {}", unsafe { GetLastError() }),
        })
    }
}

/// Resolves failed native library loads against the relocated layout
pub struct NativeResolver {
    layout: Arc<Layout>,
    opener: Arc<dyn NativeOpener>,
}

impl NativeResolver {
    pub fn new(layout: Arc<Layout>, opener: Arc<dyn NativeOpener>) -> Self {
        Self { layout, opener }
    }

    /// Ordered candidate paths for `name`: probe directories outer, name variants inner
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.layout.native_candidates(name)
    }

    /// Resolve `name` to an open handle.
    ///
    /// The first existing candidate that opens wins. A candidate that exists but
    /// fails to open is skipped, not fatal. `None` when every candidate is exhausted.
    pub fn resolve(&self, name: &str) -> Option<NativeHandle> {
        for candidate in self.candidates(name) {
            if !candidate.is_file() {
                log::trace!("native probe miss: {}", candidate.display());
                continue;
            }

            match self.opener.open(&candidate) {
                Ok(handle) => {
                    log::debug!("resolved native library `{}` -> {}", name, candidate.display());
                    return Some(handle);
                }
                Err(err) => {
                    log::warn!("skipping native candidate: {}", err);
                }
            }
        }

        log::debug!("native library `{}` not found in relocated layout", name);
        None
    }
}
