// Managed Module Resolver
// Answers "module not found" events from the relocated layout

use dashmap::DashMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use stow_probe::Layout;

use crate::context::{LoadContext, ModuleHandle};
use crate::error::LoadError;
use crate::request::ModuleRequest;

thread_local! {
    /// Full names currently being resolved on this thread
    static IN_FLIGHT: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Marks a full name as in flight until dropped
struct InFlight {
    full_name: String,
}

impl InFlight {
    /// `None` when the name is already being resolved further up this thread's stack
    fn enter(full_name: &str) -> Option<Self> {
        let inserted = IN_FLIGHT.with(|names| names.borrow_mut().insert(full_name.to_string()));
        inserted.then(|| InFlight {
            full_name: full_name.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.with(|names| {
            names.borrow_mut().remove(&self.full_name);
        });
    }
}

/// Resolves failed managed module loads.
///
/// A hit loads into the requesting context. When that context already holds a
/// non-localized module with the same simple name, the module goes into the
/// dedicated cache context instead, since one context cannot hold both; only
/// those placements are cached by full name. Localized modules always load
/// fresh into the requesting context.
pub struct ManagedResolver {
    layout: Arc<Layout>,
    cache_context: Arc<dyn LoadContext>,
    /// full name -> handle, only modules placed in `cache_context`
    cache: DashMap<String, ModuleHandle>,
    /// full name -> lock serializing its resolution
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ManagedResolver {
    pub fn new(layout: Arc<Layout>, cache_context: Arc<dyn LoadContext>) -> Self {
        Self {
            layout,
            cache_context,
            cache: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Ordered candidate paths for `request`, one per probe directory
    pub fn candidates(&self, request: &ModuleRequest) -> Vec<PathBuf> {
        self.layout
            .managed_candidates(request.culture(), request.name())
    }

    /// First candidate that exists as a file
    pub fn probe(&self, request: &ModuleRequest) -> Option<PathBuf> {
        self.candidates(request).into_iter().find(|candidate| {
            let found = candidate.is_file();
            if !found {
                log::trace!("module probe miss: {}", candidate.display());
            }
            found
        })
    }

    /// Cached handle for a full name, if any
    pub fn cached(&self, full_name: &str) -> Option<ModuleHandle> {
        self.cache.get(full_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve `request` raised by `context`.
    ///
    /// `Ok(None)` when no candidate exists (the host reports its own not-found
    /// error). The first existing candidate is authoritative: a load failure on
    /// it is returned as is, later probe directories are not tried.
    pub fn resolve(
        &self,
        context: &dyn LoadContext,
        request: &ModuleRequest,
    ) -> Result<Option<ModuleHandle>, LoadError> {
        let _in_flight = match InFlight::enter(request.full_name()) {
            Some(guard) => guard,
            None => {
                log::debug!(
                    "module `{}` requested while already resolving, skipping",
                    request.full_name()
                );
                return Ok(None);
            }
        };

        // placement check, load and cache insert run as one step per full name
        let lock = self.name_lock(request.full_name());
        let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = context.find(request.full_name()) {
            return Ok(Some(existing));
        }

        let name_taken = !request.is_localized() && context.has_module(request.name());
        if name_taken {
            if let Some(cached) = self.cached(request.full_name()) {
                log::debug!("module `{}` served from cache", request.full_name());
                return Ok(Some(cached));
            }
        }

        let path = match self.probe(request) {
            Some(path) => path,
            None => {
                log::debug!("module `{}` not found in relocated layout", request.full_name());
                return Ok(None);
            }
        };

        if !name_taken {
            log::debug!(
                "loading `{}` into `{}` from {}",
                request.full_name(),
                context.name(),
                path.display()
            );
            return context.load_from_path(request, &path).map(Some);
        }

        log::debug!(
            "`{}` already holds `{}`, loading `{}` into `{}`",
            context.name(),
            request.name(),
            request.full_name(),
            self.cache_context.name()
        );
        let handle = self.cache_context.load_from_path(request, &path)?;
        self.cache
            .insert(request.full_name().to_string(), Arc::clone(&handle));
        Ok(Some(handle))
    }

    fn name_lock(&self, full_name: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(full_name.to_string()).or_default().value())
    }
}
