// Shared Runtime Mapping Table
// `key:hash` pairs joined by `|`, parsed once on first lookup

use std::collections::HashMap;
use std::sync::OnceLock;

/// Separator between entries
pub const ENTRY_DELIMITER: char = '|';
/// Separator between key and hash inside an entry
pub const PAIR_DELIMITER: char = ':';

/// Content-hash lookup for shared runtime mode.
///
/// Keys are `<culture>/<file>` for localized modules and bare `<file>` otherwise.
/// The raw blob is kept until the first lookup; parsing happens exactly once even
/// when several threads race on first access, and the table never changes after.
#[derive(Debug, Default)]
pub struct SharedRuntimeMapping {
    raw: String,
    table: OnceLock<HashMap<String, String>>,
}

impl SharedRuntimeMapping {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            table: OnceLock::new(),
        }
    }

    /// Hash for `key`, or "" when the table has no such entry
    pub fn get(&self, key: &str) -> &str {
        self.table().get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.table().contains_key(key)
    }

    /// Number of well-formed entries
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Whether the blob has been parsed yet
    pub fn is_parsed(&self) -> bool {
        self.table.get().is_some()
    }

    fn table(&self) -> &HashMap<String, String> {
        self.table.get_or_init(|| parse_mapping(&self.raw))
    }
}

/// Parse a mapping blob. Entries that do not split into exactly two non-empty
/// parts are dropped; a repeated key keeps its last hash.
pub fn parse_mapping(raw: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for entry in raw.split(ENTRY_DELIMITER) {
        let mut parts = entry.split(PAIR_DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(hash), None) if !key.is_empty() && !hash.is_empty() => {
                table.insert(key.to_string(), hash.to_string());
            }
            _ => {
                if !entry.is_empty() {
                    log::trace!("dropping malformed shared runtime entry `{}`", entry);
                }
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lookup_with_default() {
        let mapping = SharedRuntimeMapping::new("a.dll:deadbeef|b.dll:cafef00d");
        assert_eq!(mapping.get("a.dll"), "deadbeef");
        assert_eq!(mapping.get("b.dll"), "cafef00d");
        assert_eq!(mapping.get("c.dll"), "");
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_malformed_entries_ignored() {
        let mapping =
            SharedRuntimeMapping::new("badentry|a.dll:deadbeef|:||b.dll:cafef00d|x:y:z|k:|:v");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("a.dll"), "deadbeef");
        assert_eq!(mapping.get("b.dll"), "cafef00d");
        assert!(!mapping.contains_key("badentry"));
        assert!(!mapping.contains_key("x"));
        assert!(!mapping.contains_key("k"));
        assert!(!mapping.contains_key(""));
    }

    #[test]
    fn test_localized_keys() {
        let mapping = SharedRuntimeMapping::new("fr/Foo.resources.dll:h2|Foo.dll:h1");
        assert_eq!(mapping.get("fr/Foo.resources.dll"), "h2");
        assert_eq!(mapping.get("Foo.dll"), "h1");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let table = parse_mapping("a.dll:1|a.dll:2");
        assert_eq!(table.get("a.dll").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_empty_blob() {
        let mapping = SharedRuntimeMapping::default();
        assert!(mapping.is_empty());
        assert_eq!(mapping.get("anything"), "");
    }

    #[test]
    fn test_parsed_lazily() {
        let mapping = SharedRuntimeMapping::new("a.dll:1");
        assert!(!mapping.is_parsed());
        mapping.get("a.dll");
        assert!(mapping.is_parsed());
    }

    #[test]
    fn test_concurrent_first_access() {
        let blob: String = (0..500)
            .map(|i| format!("m{}.dll:h{}", i, i))
            .collect::<Vec<_>>()
            .join("|");
        let mapping = Arc::new(SharedRuntimeMapping::new(blob));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let mapping = Arc::clone(&mapping);
                thread::spawn(move || {
                    let key = format!("m{}.dll", t * 50);
                    (mapping.len(), mapping.get(&key).to_string())
                })
            })
            .collect();

        for (t, handle) in handles.into_iter().enumerate() {
            let (len, hash) = handle.join().unwrap();
            assert_eq!(len, 500);
            assert_eq!(hash, format!("h{}", t * 50));
        }
    }
}
