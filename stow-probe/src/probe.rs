// Probe Path Resolver
// Turns the configured directory list into ordered absolute candidate roots

use std::path::{Component, Path, PathBuf};

/// Separator between entries of the library-directories setting
pub const PROBE_DELIMITER: char = ';';

/// Resolve a delimiter-separated directory list against the application base.
///
/// Order is preserved and duplicates are kept; only empty entries are dropped.
/// Rooted entries are taken as-is, everything else is joined onto `base_dir`.
/// Results are lexically normalized, the filesystem is never touched.
///
/// # Example
/// ```
/// # use std::path::{Path, PathBuf};
/// # use stow_probe::probe::resolve_probe_directories;
/// let probes = resolve_probe_directories(".;;libs", Path::new("/app"));
/// assert_eq!(probes, vec![PathBuf::from("/app"), PathBuf::from("/app/libs")]);
/// ```
pub fn resolve_probe_directories(list: &str, base_dir: &Path) -> Vec<PathBuf> {
    list.split(PROBE_DELIMITER)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let entry = Path::new(entry);
            if is_rooted(entry) {
                normalize_path(entry)
            } else {
                normalize_path(&base_dir.join(entry))
            }
        })
        .collect()
}

/// An entry that starts at a filesystem root (or carries a drive prefix)
fn is_rooted(path: &Path) -> bool {
    path.has_root() || path.is_absolute()
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the parent.
///
/// `..` never climbs above the root; on a relative path leading `..` segments are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_empty_entries() {
        let base = Path::new("/app");
        let probes = resolve_probe_directories(";libs;;", base);
        assert_eq!(probes, vec![PathBuf::from("/app/libs")]);
    }

    #[test]
    fn test_empty_list() {
        assert!(resolve_probe_directories("", Path::new("/app")).is_empty());
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let base = Path::new("/app");
        let probes = resolve_probe_directories("b;a;b", base);
        assert_eq!(
            probes,
            vec![
                PathBuf::from("/app/b"),
                PathBuf::from("/app/a"),
                PathBuf::from("/app/b"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_entry_untouched() {
        let probes = resolve_probe_directories("/opt/shared;libs", Path::new("/app"));
        assert_eq!(
            probes,
            vec![PathBuf::from("/opt/shared"), PathBuf::from("/app/libs")]
        );
    }

    #[test]
    fn test_dot_entry_is_base() {
        let probes = resolve_probe_directories(".;./libs/../runtime", Path::new("/app"));
        assert_eq!(
            probes,
            vec![PathBuf::from("/app"), PathBuf::from("/app/runtime")]
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/b/..")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("a//b")), PathBuf::from("a/b"));
    }
}
