// Relocated directory layout
//
// Managed module, default mode: <probe>/[locales/<culture>/]<name>.<suffix>
// Managed module, dedup mode:   <probe>/[locales/<culture>/]<name>.<suffix>/<hash>/<name>.<suffix>
// Native library, default mode: <probe>/<variant>
// Native library, dedup mode:   <probe>/srm_native/<app-id>/<variant>

use std::path::{Path, PathBuf};

use crate::config::{LoaderConfig, SharedRuntimeMode};
use crate::mapping::SharedRuntimeMapping;
use crate::platform::PlatformFamily;
use crate::probe::{normalize_path, resolve_probe_directories};

/// Directory holding culture-specific module overrides
pub const LOCALES_DIR: &str = "locales";
/// Directory holding per-app native libraries in shared runtime mode
pub const SRM_NATIVE_DIR: &str = "srm_native";

/// Resolved loader settings plus the candidate path rules built on them.
///
/// Built once at startup and shared by every resolver; the probe order and the
/// mapping table are fixed for the lifetime of the value.
#[derive(Debug)]
pub struct Layout {
    base_dir: PathBuf,
    probes: Vec<PathBuf>,
    mode: SharedRuntimeMode,
    app_id: String,
    mapping: SharedRuntimeMapping,
    module_suffix: String,
    platform: PlatformFamily,
}

impl Layout {
    pub fn new<P: Into<PathBuf>>(config: &LoaderConfig, base_dir: P) -> Self {
        let base_dir = base_dir.into();
        let probes = resolve_probe_directories(&config.library_directories, &base_dir);

        log::debug!(
            "loader layout: {} probe directories, shared runtime mode `{}`",
            probes.len(),
            config.mode()
        );

        Self {
            base_dir,
            probes,
            mode: config.mode(),
            app_id: config.shared_runtime_app_id.clone(),
            mapping: SharedRuntimeMapping::new(config.shared_runtime_mapping.clone()),
            module_suffix: config.module_suffix.clone(),
            platform: PlatformFamily::current(),
        }
    }

    /// Use another platform's native naming rules
    pub fn with_platform(mut self, platform: PlatformFamily) -> Self {
        self.platform = platform;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn probes(&self) -> &[PathBuf] {
        &self.probes
    }

    pub fn mode(&self) -> &SharedRuntimeMode {
        &self.mode
    }

    pub fn is_shared_runtime(&self) -> bool {
        self.mode.is_enabled()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn mapping(&self) -> &SharedRuntimeMapping {
        &self.mapping
    }

    pub fn platform(&self) -> PlatformFamily {
        self.platform
    }

    /// `Foo` -> `Foo.dll` (with the default suffix)
    pub fn module_file_name(&self, simple_name: &str) -> String {
        if self.module_suffix.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{}", simple_name, self.module_suffix)
        }
    }

    /// Mapping key: `<culture>/<file>`, or the bare file name for the default culture
    pub fn shared_runtime_key(culture: &str, file_name: &str) -> String {
        if culture.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", culture, file_name)
        }
    }

    /// Candidate path of a managed module under one probe directory.
    ///
    /// In dedup mode a missing mapping entry gives an empty hash segment, so the
    /// path collapses to `<file>/<file>`; no other fallback is attempted.
    pub fn managed_candidate(&self, probe: &Path, culture: &str, simple_name: &str) -> PathBuf {
        let mut path = probe.to_path_buf();
        if !culture.is_empty() {
            path.push(LOCALES_DIR);
            path.push(culture);
        }

        let file_name = self.module_file_name(simple_name);

        if self.is_shared_runtime() {
            let key = Self::shared_runtime_key(culture, &file_name);
            let hash = self.mapping.get(&key);
            path.push(&file_name);
            path.push(hash);
            path.push(&file_name);
        } else {
            path.push(&file_name);
        }

        normalize_path(&path)
    }

    /// Every managed candidate, in probe order
    pub fn managed_candidates(&self, culture: &str, simple_name: &str) -> Vec<PathBuf> {
        self.probes
            .iter()
            .map(|probe| self.managed_candidate(probe, culture, simple_name))
            .collect()
    }

    /// Candidate path of one native name variant under one probe directory
    pub fn native_candidate(&self, probe: &Path, variant: &str) -> PathBuf {
        let path = if self.is_shared_runtime() {
            probe.join(SRM_NATIVE_DIR).join(&self.app_id).join(variant)
        } else {
            probe.join(variant)
        };
        normalize_path(&path)
    }

    /// Every native candidate: outer loop over probes, inner loop over variants,
    /// so an earlier probe directory always wins over a later one.
    pub fn native_candidates(&self, name: &str) -> Vec<PathBuf> {
        let variants = self.platform.native_name_variants(name);
        self.probes
            .iter()
            .flat_map(|probe| {
                variants
                    .iter()
                    .map(move |variant| self.native_candidate(probe, variant))
            })
            .collect()
    }
}
