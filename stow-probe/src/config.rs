// Process-wide loader configuration
// The host hands these over as opaque key/value strings at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Key holding the `;`-separated probe directory list
pub const LIBRARY_DIRECTORIES_KEY: &str = "library-directories";
/// Key holding the shared runtime mode flag
pub const SHARED_RUNTIME_MODE_KEY: &str = "shared-runtime-mode";
/// Key holding the app namespace used under `srm_native/`
pub const SHARED_RUNTIME_APP_ID_KEY: &str = "shared-runtime-app-id";
/// Key holding the `|`-delimited `key:hash` blob
pub const SHARED_RUNTIME_MAPPING_KEY: &str = "shared-runtime-mapping";
/// Key overriding the managed module file suffix
pub const MODULE_SUFFIX_KEY: &str = "module-suffix";

/// Names the publish-time tool writes into `runtimeOptions.configProperties`
pub const PUBLISHED_LIBRARY_DIRECTORIES_KEY: &str = "NetBeautyLibsDir";
pub const PUBLISHED_SHARED_RUNTIME_MODE_KEY: &str = "NetBeautySharedRuntimeMode";
pub const PUBLISHED_SHARED_RUNTIME_APP_ID_KEY: &str = "NetBeautyAppID";
pub const PUBLISHED_SHARED_RUNTIME_MAPPING_KEY: &str = "NetBeautySharedRuntimeMapping";

/// Environment variables read by [`LoaderConfig::from_env`], paired with their keys
const ENV_KEYS: &[(&str, &str)] = &[
    ("STOW_LIBRARY_DIRECTORIES", LIBRARY_DIRECTORIES_KEY),
    ("STOW_SHARED_RUNTIME_MODE", SHARED_RUNTIME_MODE_KEY),
    ("STOW_SHARED_RUNTIME_APP_ID", SHARED_RUNTIME_APP_ID_KEY),
    ("STOW_SHARED_RUNTIME_MAPPING", SHARED_RUNTIME_MAPPING_KEY),
    ("STOW_MODULE_SUFFIX", MODULE_SUFFIX_KEY),
];

/// Raw loader configuration, exactly as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Probe directories, absolute or relative to the application base
    #[serde(rename = "library-directories", alias = "NetBeautyLibsDir", default)]
    pub library_directories: String,

    /// Mode flag; anything other than "" or "no" turns dedup on
    #[serde(rename = "shared-runtime-mode", alias = "NetBeautySharedRuntimeMode", default)]
    pub shared_runtime_mode: String,

    /// Namespace segment for native libraries in dedup mode
    #[serde(rename = "shared-runtime-app-id", alias = "NetBeautyAppID", default)]
    pub shared_runtime_app_id: String,

    /// Serialized mapping table
    #[serde(
        rename = "shared-runtime-mapping",
        alias = "NetBeautySharedRuntimeMapping",
        default
    )]
    pub shared_runtime_mapping: String,

    /// Managed module file suffix, without the dot
    #[serde(rename = "module-suffix", default = "default_module_suffix")]
    pub module_suffix: String,
}

fn default_module_suffix() -> String {
    "dll".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            library_directories: String::new(),
            shared_runtime_mode: String::new(),
            shared_runtime_app_id: String::new(),
            shared_runtime_mapping: String::new(),
            module_suffix: default_module_suffix(),
        }
    }
}

impl LoaderConfig {
    /// Build from host key/value pairs. Unknown keys are ignored.
    pub fn from_properties<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in properties {
            config.set(key.as_ref(), value.into());
        }
        config
    }

    /// Load the `runtimeOptions.configProperties` section of a JSON runtime
    /// configuration file. A file without that section yields the defaults.
    pub fn from_runtime_config<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runtime config: {}", path.display()))?;
        Self::from_runtime_config_str(&content)
            .with_context(|| format!("Invalid runtime config: {}", path.display()))
    }

    /// Same as [`LoaderConfig::from_runtime_config`], from an in-memory document
    pub fn from_runtime_config_str(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content)?;

        let properties = match root.pointer("/runtimeOptions/configProperties") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ConfigError::InvalidSection {
                    section: "runtimeOptions.configProperties".to_string(),
                    found: json_kind(other),
                }
                .into())
            }
        };

        Ok(Self::from_properties(properties.iter().filter_map(
            |(key, value)| value.as_str().map(|s| (key.as_str(), s.to_string())),
        )))
    }

    /// Build from `STOW_*` environment variables
    pub fn from_env() -> Self {
        Self::from_properties(
            ENV_KEYS
                .iter()
                .filter_map(|(var, key)| std::env::var(var).ok().map(|value| (*key, value))),
        )
    }

    fn set(&mut self, key: &str, value: String) {
        match key {
            LIBRARY_DIRECTORIES_KEY | PUBLISHED_LIBRARY_DIRECTORIES_KEY => {
                self.library_directories = value
            }
            SHARED_RUNTIME_MODE_KEY | PUBLISHED_SHARED_RUNTIME_MODE_KEY => {
                self.shared_runtime_mode = value
            }
            SHARED_RUNTIME_APP_ID_KEY | PUBLISHED_SHARED_RUNTIME_APP_ID_KEY => {
                self.shared_runtime_app_id = value
            }
            SHARED_RUNTIME_MAPPING_KEY | PUBLISHED_SHARED_RUNTIME_MAPPING_KEY => {
                self.shared_runtime_mapping = value
            }
            MODULE_SUFFIX_KEY => self.module_suffix = value,
            _ => log::trace!("ignoring unknown loader property `{}`", key),
        }
    }

    /// Parsed shared runtime mode
    pub fn mode(&self) -> SharedRuntimeMode {
        SharedRuntimeMode::parse(&self.shared_runtime_mode)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Shared runtime (content-addressed dedup) mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SharedRuntimeMode {
    #[default]
    Disabled,
    /// Enabled under the given mode name (usually "default")
    Enabled(String),
}

impl SharedRuntimeMode {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "" | "no" => SharedRuntimeMode::Disabled,
            other => SharedRuntimeMode::Enabled(other.to_string()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SharedRuntimeMode::Enabled(_))
    }
}

impl fmt::Display for SharedRuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedRuntimeMode::Disabled => write!(f, "no"),
            SharedRuntimeMode::Enabled(name) => write!(f, "{}", name),
        }
    }
}
