//! Stow Probe - where relocated dependencies live on disk
//!
//! This crate provides:
//! - Loader configuration as handed over by the host at startup
//! - Probe directory resolution against the application base directory
//! - The shared runtime mapping table (content-hash lookup, parsed once)
//! - Platform-specific native library name variants
//! - The relocated layout contract that turns all of the above into candidate paths

pub mod config;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod platform;
pub mod probe;

pub use config::{LoaderConfig, SharedRuntimeMode};
pub use error::ConfigError;
pub use layout::{Layout, LOCALES_DIR, SRM_NATIVE_DIR};
pub use mapping::SharedRuntimeMapping;
pub use platform::PlatformFamily;
pub use probe::{normalize_path, resolve_probe_directories, PROBE_DELIMITER};
