// Isolation Context Manager
//
// The loader's own code and dependencies live in a dedicated context so they
// neither leak into the application's primary context nor get resolved through
// it. A second context only holds deduplicated same-name modules.

use std::path::Path;
use std::sync::Arc;

use stow_probe::{Layout, LoaderConfig};

use crate::context::{IsolatedContext, LoadContext, ModuleHandle};
use crate::error::LoadError;
use crate::loader::Loader;
use crate::native::NativeOpener;
use crate::request::ModuleRequest;

/// Name of the context holding the loader implementation
pub const LOADER_CONTEXT_NAME: &str = "stow.loader";
/// Name of the context holding deduplicated modules
pub const SHARED_CONTEXT_NAME: &str = "stow.shared";

pub struct IsolationManager {
    loader: Arc<Loader>,
    loader_context: Arc<IsolatedContext>,
    shared_context: Arc<IsolatedContext>,
    implementation: Option<ModuleHandle>,
}

impl IsolationManager {
    /// Startup wiring.
    ///
    /// 1. create the loader's isolated context
    /// 2. load the loader implementation image into it, when given
    /// 3. register the loader on `primary` and on the loader's own context
    ///
    /// The shared cache context is created here too but never registered.
    pub fn install(
        layout: Arc<Layout>,
        primary: &dyn LoadContext,
        opener: Arc<dyn NativeOpener>,
        implementation: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let loader_context = Arc::new(IsolatedContext::new(
            LOADER_CONTEXT_NAME,
            Arc::clone(&opener),
        ));

        let implementation = implementation
            .map(|path| {
                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .ok_or_else(|| LoadError::BadImage {
                        path: path.to_path_buf(),
                        reason: "no usable file name".to_string(),
                    })?;
                loader_context.load_from_path(&ModuleRequest::new(name), path)
            })
            .transpose()?;

        let shared_context = Arc::new(IsolatedContext::new(
            SHARED_CONTEXT_NAME,
            Arc::clone(&opener),
        ));
        let loader = Arc::new(Loader::new(
            layout,
            Arc::clone(&shared_context) as Arc<dyn LoadContext>,
            opener,
        ));

        loader.register(primary);
        loader.register(loader_context.as_ref());

        log::info!(
            "loader installed on `{}` and `{}`",
            primary.name(),
            LOADER_CONTEXT_NAME
        );

        Ok(Self {
            loader,
            loader_context,
            shared_context,
            implementation,
        })
    }

    /// Build the layout for `base_dir` from `config`, then [`install`](Self::install).
    pub fn from_config<P: AsRef<Path>>(
        config: &LoaderConfig,
        base_dir: P,
        primary: &dyn LoadContext,
        opener: Arc<dyn NativeOpener>,
        implementation: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let layout = Arc::new(Layout::new(config, base_dir.as_ref()));
        Self::install(layout, primary, opener, implementation)
    }

    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    /// Context the loader's own dependencies resolve in
    pub fn loader_context(&self) -> &Arc<IsolatedContext> {
        &self.loader_context
    }

    /// Cache home for deduplicated non-localized modules
    pub fn shared_context(&self) -> &Arc<IsolatedContext> {
        &self.shared_context
    }

    /// The loader implementation image, if one was loaded at install
    pub fn implementation(&self) -> Option<&ModuleHandle> {
        self.implementation.as_ref()
    }
}
