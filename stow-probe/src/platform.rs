/**
 * Platform Family
 * Selects the native library naming rules for the running OS
 */
use std::fmt;

/// OS families that differ in native library file naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Windows,
    MacOS,
    /// Linux, the BSDs and any other Unix-like system
    Unix,
}

impl PlatformFamily {
    /// Get the family of the current target at compile time
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformFamily::Windows
        } else if cfg!(any(target_os = "macos", target_os = "ios")) {
            PlatformFamily::MacOS
        } else {
            PlatformFamily::Unix
        }
    }

    /// Lowercase name, e.g. `PlatformFamily::MacOS` -> "macos"
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Windows => "windows",
            PlatformFamily::MacOS => "macos",
            PlatformFamily::Unix => "unix",
        }
    }

    /// All families (for testing/validation)
    pub fn all() -> &'static [PlatformFamily] {
        &[
            PlatformFamily::Windows,
            PlatformFamily::MacOS,
            PlatformFamily::Unix,
        ]
    }

    /// Suffix a native library file carries on this family
    pub fn native_suffix(&self) -> &'static str {
        match self {
            PlatformFamily::Windows => ".dll",
            PlatformFamily::MacOS => ".dylib",
            PlatformFamily::Unix => ".so",
        }
    }

    /// Candidate file names for a requested native library, in probe order.
    ///
    /// - Windows: `N`, then `N.dll` and `N.exe` unless `N` already ends in one of them
    /// - macOS: `N`, `libN`, then `N.dylib` and `libN.dylib` unless `N` ends in `.dylib`
    /// - Unix: `N`, `libN`, then `N.so` and `libN.so` unless `N` ends in `.so`
    pub fn native_name_variants(&self, name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];

        match self {
            PlatformFamily::Windows => {
                if !name.ends_with(".dll") && !name.ends_with(".exe") {
                    names.push(format!("{}.dll", name));
                    names.push(format!("{}.exe", name));
                }
            }
            PlatformFamily::MacOS | PlatformFamily::Unix => {
                let suffix = self.native_suffix();
                names.push(format!("lib{}", name));
                if !name.ends_with(suffix) {
                    names.push(format!("{}{}", name, suffix));
                    names.push(format!("lib{}{}", name, suffix));
                }
            }
        }

        names
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
