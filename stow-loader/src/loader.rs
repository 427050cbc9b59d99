// Combined resolution handler
// One value the host registers on every context that should see relocated files

use std::sync::Arc;

use stow_probe::Layout;

use crate::context::{LoadContext, ModuleHandle, ResolveHandler};
use crate::error::LoadError;
use crate::managed::ManagedResolver;
use crate::native::{NativeHandle, NativeOpener, NativeResolver};
use crate::request::ModuleRequest;

/// Managed and native resolvers sharing one layout
pub struct Loader {
    layout: Arc<Layout>,
    managed: ManagedResolver,
    native: NativeResolver,
}

impl Loader {
    /// `cache_context` receives non-localized modules whose simple name is
    /// already taken in the requesting context. It is never registered with
    /// this loader.
    pub fn new(
        layout: Arc<Layout>,
        cache_context: Arc<dyn LoadContext>,
        opener: Arc<dyn NativeOpener>,
    ) -> Self {
        Self {
            managed: ManagedResolver::new(Arc::clone(&layout), cache_context),
            native: NativeResolver::new(Arc::clone(&layout), opener),
            layout,
        }
    }

    /// Wire this loader's callbacks into `context`
    pub fn register(self: &Arc<Self>, context: &dyn LoadContext) {
        log::debug!("registering loader callbacks on `{}`", context.name());
        context.attach(Arc::clone(self) as Arc<dyn ResolveHandler>);
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn managed(&self) -> &ManagedResolver {
        &self.managed
    }

    pub fn native(&self) -> &NativeResolver {
        &self.native
    }
}

impl ResolveHandler for Loader {
    fn resolve_module(
        &self,
        context: &dyn LoadContext,
        request: &ModuleRequest,
    ) -> Result<Option<ModuleHandle>, LoadError> {
        self.managed.resolve(context, request)
    }

    fn resolve_native(&self, name: &str) -> Option<NativeHandle> {
        self.native.resolve(name)
    }
}
