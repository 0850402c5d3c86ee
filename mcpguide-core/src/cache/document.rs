use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Cached answer to "does document X exist in category Y".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCacheEntry {
    pub exists: bool,
    /// Canonical matches for an existing document; `None` when it does not
    /// exist.
    pub matched: Option<Vec<PathBuf>>,
}

/// Existence cache keyed by `(category, document)`.
///
/// There is no TTL: entries stay valid until the category's glob
/// configuration changes, at which point the mutating code path must call
/// [`Self::invalidate_category`] synchronously. The lock is held only across
/// the map mutation - never across a glob call or any I/O - so unrelated
/// concurrent lookups are not serialized behind a slow disk scan.
#[derive(Debug, Default)]
pub struct DocumentExistenceCache {
    entries: Mutex<HashMap<String, HashMap<String, DocumentCacheEntry>>>,
}

impl DocumentExistenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str, document: &str) -> Option<DocumentCacheEntry> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(category)
            .and_then(|documents| documents.get(document))
            .cloned()
    }

    pub fn set(
        &self,
        category: &str,
        document: &str,
        exists: bool,
        matched: Option<Vec<PathBuf>>,
    ) {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(category.to_string())
            .or_default()
            .insert(document.to_string(), DocumentCacheEntry { exists, matched });
    }

    /// Remove every entry cached under `category`. This is the only
    /// correctness mechanism for the cache; any code path that mutates a
    /// category's `dir` or `patterns` must call it.
    pub fn invalidate_category(&self, category: &str) {
        self.entries.lock().unwrap().remove(category);
    }

    /// Administrative/test reset.
    pub fn clear_all(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_absent() {
        let cache = DocumentExistenceCache::new();
        assert!(cache.get("guide", "setup").is_none());
    }

    #[test]
    fn test_set_then_get() {
        let cache = DocumentExistenceCache::new();
        let matched = vec![PathBuf::from("/docs/setup.md")];
        cache.set("guide", "setup", true, Some(matched.clone()));

        let entry = cache.get("guide", "setup").unwrap();
        assert!(entry.exists);
        assert_eq!(entry.matched, Some(matched));
    }

    #[test]
    fn test_negative_entry() {
        let cache = DocumentExistenceCache::new();
        cache.set("guide", "missing", false, None);

        let entry = cache.get("guide", "missing").unwrap();
        assert!(!entry.exists);
        assert!(entry.matched.is_none());
    }

    #[test]
    fn test_invalidate_category_removes_all_its_entries() {
        let cache = DocumentExistenceCache::new();
        cache.set("guide", "setup", true, Some(vec![]));
        cache.set("guide", "install", false, None);
        cache.set("lang", "rust", true, Some(vec![]));

        cache.invalidate_category("guide");

        assert!(cache.get("guide", "setup").is_none());
        assert!(cache.get("guide", "install").is_none());
        // Other categories untouched
        assert!(cache.get("lang", "rust").is_some());
    }

    #[test]
    fn test_clear_all() {
        let cache = DocumentExistenceCache::new();
        cache.set("guide", "setup", true, Some(vec![]));
        cache.set("lang", "rust", true, Some(vec![]));

        cache.clear_all();

        assert!(cache.get("guide", "setup").is_none());
        assert!(cache.get("lang", "rust").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(DocumentExistenceCache::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let document = format!("doc{i}");
                cache.set("guide", &document, true, Some(vec![]));
                cache.get("guide", &document)
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
    }
}
