// Shared fixtures for the integration tests; included with `mod common;`
#![allow(dead_code)]

use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use stow_loader::{IsolatedContext, Layout, LoadError, LoaderConfig, NativeHandle, NativeOpener};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn write_image(path: &Path) {
    fs::create_dir_all(path.parent().expect("image has a parent")).expect("created dirs");
    fs::write(path, b"MZ image").expect("wrote image");
}

pub fn layout(base: &Path, pairs: &[(&str, &str)]) -> Arc<Layout> {
    let config = LoaderConfig::from_properties(pairs.iter().copied());
    Arc::new(Layout::new(&config, base))
}

/// Opens any existing absolute file, refuses everything else
#[derive(Default)]
pub struct FakeOpener {
    pub opened: Mutex<Vec<PathBuf>>,
}

impl NativeOpener for FakeOpener {
    fn open(&self, path: &Path) -> Result<NativeHandle, LoadError> {
        if !path.is_absolute() || !path.is_file() {
            return Err(LoadError::NativeOpen {
                path: path.to_path_buf(),
                reason: "not found".to_string(),
            });
        }
        let mut opened = self.opened.lock().expect("lock");
        opened.push(path.to_path_buf());
        Ok(NativeHandle::from_raw(opened.len() as *mut c_void).expect("non-null"))
    }
}

pub fn primary(opener: Arc<FakeOpener>) -> IsolatedContext {
    IsolatedContext::new("default", opener)
}
