//! Stow Loader - run-time resolution of relocated dependencies
//!
//! The host calls in when a managed module or native library load misses.
//! Candidates come from the `stow-probe` layout; the first existing one is
//! handed to the host's own load primitive.

pub mod context;
pub mod error;
pub mod isolation;
pub mod loader;
pub mod managed;
pub mod native;
pub mod request;

pub use context::{IsolatedContext, LoadContext, LoadedModule, ModuleHandle, ResolveHandler};
pub use error::LoadError;
pub use isolation::{IsolationManager, LOADER_CONTEXT_NAME, SHARED_CONTEXT_NAME};
pub use loader::Loader;
pub use managed::ManagedResolver;
pub use native::{NativeHandle, NativeOpener, NativeResolver, SystemOpener};
pub use request::ModuleRequest;

// Re-export the layout types hosts need to build a loader
pub use stow_probe::{Layout, LoaderConfig, PlatformFamily, SharedRuntimeMode};
