// Load contexts
// The host-facing seam: a loading namespace, its load primitive, and the
// handlers it consults when a load misses.

use dashmap::DashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::LoadError;
use crate::native::{NativeHandle, NativeOpener};
use crate::request::ModuleRequest;

/// A module loaded into some context
#[derive(Debug)]
pub struct LoadedModule {
    pub name: String,
    pub culture: String,
    pub full_name: String,
    pub path: PathBuf,
    /// Name of the context the module lives in
    pub context: String,
    pub image_len: u64,
}

impl LoadedModule {
    pub fn is_localized(&self) -> bool {
        !self.culture.is_empty()
    }
}

/// Shared handle to a loaded module; compare with `Arc::ptr_eq`
pub type ModuleHandle = Arc<LoadedModule>;

/// Callbacks a load context invokes when its own lookup misses.
///
/// `Ok(None)` is a soft miss and lets the next handler (or the host's own
/// not-found handling) run; `Err` aborts the load.
pub trait ResolveHandler: Send + Sync {
    fn resolve_module(
        &self,
        context: &dyn LoadContext,
        request: &ModuleRequest,
    ) -> Result<Option<ModuleHandle>, LoadError>;

    fn resolve_native(&self, name: &str) -> Option<NativeHandle>;
}

/// A loading namespace
pub trait LoadContext: Send + Sync {
    fn name(&self) -> &str;

    /// Module already loaded here under exactly this full name
    fn find(&self, full_name: &str) -> Option<ModuleHandle>;

    /// Whether a non-localized module with this simple name is already loaded here
    fn has_module(&self, simple_name: &str) -> bool;

    /// The host's load primitive: load the image at `path` into this context
    fn load_from_path(&self, request: &ModuleRequest, path: &Path)
        -> Result<ModuleHandle, LoadError>;

    /// Register resolution callbacks for misses in this context
    fn attach(&self, handler: Arc<dyn ResolveHandler>);
}

/// Reference load context.
///
/// Holds at most one non-localized module per simple name (and one localized
/// module per name and culture), asks its handlers on a miss, and searches
/// native libraries through its opener before asking the handlers.
/// Loading an identity that is already present returns the existing module.
pub struct IsolatedContext {
    name: String,
    /// full name -> module
    modules: DashMap<String, ModuleHandle>,
    /// requested name -> handle
    natives: DashMap<String, NativeHandle>,
    handlers: RwLock<Vec<Arc<dyn ResolveHandler>>>,
    opener: Arc<dyn NativeOpener>,
    load_lock: Mutex<()>,
}

impl IsolatedContext {
    pub fn new(name: impl Into<String>, opener: Arc<dyn NativeOpener>) -> Self {
        Self {
            name: name.into(),
            modules: DashMap::new(),
            natives: DashMap::new(),
            handlers: RwLock::new(Vec::new()),
            opener,
            load_lock: Mutex::new(()),
        }
    }

    /// Load a module by request: own modules first, then every attached handler
    /// in registration order. Fails with `ModuleNotFound` after a total miss.
    pub fn load(&self, request: &ModuleRequest) -> Result<ModuleHandle, LoadError> {
        if let Some(found) = self.find(request.full_name()) {
            return Ok(found);
        }

        for handler in self.handlers() {
            if let Some(handle) = handler.resolve_module(self, request)? {
                return Ok(handle);
            }
        }

        Err(LoadError::ModuleNotFound(request.full_name().to_string()))
    }

    /// Load a native library: platform default search first, then the handlers
    pub fn load_native(&self, name: &str) -> Result<NativeHandle, LoadError> {
        if let Some(handle) = self.natives.get(name) {
            return Ok(*handle.value());
        }

        let handle = match self.opener.open(Path::new(name)) {
            Ok(handle) => handle,
            Err(err) => {
                log::trace!("default native search failed in `{}`: {}", self.name, err);
                self.handlers()
                    .iter()
                    .find_map(|handler| handler.resolve_native(name))
                    .ok_or_else(|| LoadError::NativeNotFound(name.to_string()))?
            }
        };

        self.natives.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Snapshot of the loaded modules
    pub fn modules(&self) -> Vec<ModuleHandle> {
        self.modules
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshot so no lock is held while a handler runs
    fn handlers(&self) -> Vec<Arc<dyn ResolveHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn has_localized(&self, simple_name: &str, culture: &str) -> bool {
        self.modules
            .iter()
            .any(|entry| entry.value().name == simple_name && entry.value().culture == culture)
    }
}

impl LoadContext for IsolatedContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, full_name: &str) -> Option<ModuleHandle> {
        self.modules
            .get(full_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn has_module(&self, simple_name: &str) -> bool {
        self.modules
            .iter()
            .any(|entry| entry.value().name == simple_name && !entry.value().is_localized())
    }

    fn load_from_path(
        &self,
        request: &ModuleRequest,
        path: &Path,
    ) -> Result<ModuleHandle, LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let metadata = file.metadata().map_err(io_error)?;

        if !metadata.is_file() {
            return Err(LoadError::BadImage {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        if metadata.len() == 0 {
            return Err(LoadError::BadImage {
                path: path.to_path_buf(),
                reason: "empty image".to_string(),
            });
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // same identity loaded meanwhile by another thread
        if let Some(existing) = self.find(request.full_name()) {
            return Ok(existing);
        }

        let taken = if request.is_localized() {
            self.has_localized(request.name(), request.culture())
        } else {
            self.has_module(request.name())
        };
        if taken {
            return Err(LoadError::DuplicateModule {
                name: request.name().to_string(),
                context: self.name.clone(),
            });
        }

        let module = Arc::new(LoadedModule {
            name: request.name().to_string(),
            culture: request.culture().to_string(),
            full_name: request.full_name().to_string(),
            path: path.to_path_buf(),
            context: self.name.clone(),
            image_len: metadata.len(),
        });
        self.modules
            .insert(request.full_name().to_string(), Arc::clone(&module));

        log::debug!(
            "loaded `{}` into `{}` from {}",
            request.full_name(),
            self.name,
            path.display()
        );
        Ok(module)
    }

    fn attach(&self, handler: Arc<dyn ResolveHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }
}
