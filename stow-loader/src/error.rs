use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Raised by a load context once every resolver has soft-missed
    #[error("Could not load module '{0}': no matching file was found")]
    ModuleNotFound(String),

    #[error("Unable to load native library '{0}'")]
    NativeNotFound(String),

    #[error("Bad module image '{}': {reason}", path.display())]
    BadImage { path: PathBuf, reason: String },

    #[error("A module named '{name}' is already loaded in context '{context}'")]
    DuplicateModule { name: String, context: String },

    #[error("Failed to open native library '{}': {reason}", path.display())]
    NativeOpen { path: PathBuf, reason: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
