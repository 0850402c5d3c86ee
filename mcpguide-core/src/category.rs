//! Document discovery within configured categories.
//!
//! A category is a named directory plus a glob pattern set, owned by the
//! config collaborator; this module only consumes it. Lookups are answered
//! from the existence cache when possible so repeated requests for the same
//! document do not re-glob the disk; the cache is kept consistent by the
//! mutation notifications the config layer is required to forward.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::document::DocumentExistenceCache;
use crate::config::GlobLimits;
use crate::error::AccessError;
use crate::file::glob_search;
use crate::security::PathValidator;

/// A named directory + glob pattern set under which documents are
/// discovered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub dir: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Cached document discovery over categories.
pub struct DocumentLookup {
    validator: Arc<PathValidator>,
    cache: Arc<DocumentExistenceCache>,
    limits: GlobLimits,
}

impl DocumentLookup {
    pub fn new(
        validator: Arc<PathValidator>,
        cache: Arc<DocumentExistenceCache>,
        limits: GlobLimits,
    ) -> Self {
        Self {
            validator,
            cache,
            limits,
        }
    }

    /// Find the files backing `document` in `category`.
    ///
    /// Returns `None` when no matching document exists. The answer is cached
    /// per `(category, document)` - positive or negative - until the
    /// category is invalidated, so N repeated lookups glob the disk exactly
    /// once.
    pub async fn find_document(
        &self,
        docroot: &Path,
        category: &Category,
        document: &str,
    ) -> Result<Option<Vec<PathBuf>>, AccessError> {
        if let Some(entry) = self.cache.get(&category.name, document) {
            debug!("Document cache hit for {}/{document}", category.name);
            return Ok(if entry.exists {
                Some(entry.matched.unwrap_or_default())
            } else {
                None
            });
        }

        let dir = self.validator.validate(&category.dir, docroot)?;
        let matches = glob_search::search(&dir, &[document.to_string()], &self.limits);

        if matches.is_empty() {
            self.cache.set(&category.name, document, false, None);
            Ok(None)
        } else {
            self.cache
                .set(&category.name, document, true, Some(matches.clone()));
            Ok(Some(matches))
        }
    }

    /// List every file the category's configured patterns match. Uncached:
    /// the result is shaped by the whole pattern set, not a single document
    /// key.
    pub async fn list_documents(
        &self,
        docroot: &Path,
        category: &Category,
    ) -> Result<Vec<PathBuf>, AccessError> {
        let dir = self.validator.validate(&category.dir, docroot)?;
        Ok(glob_search::search(&dir, &category.patterns, &self.limits))
    }

    /// Category-mutation notification: must be called by any code path that
    /// changes a category's `dir` or `patterns`.
    pub fn invalidate(&self, category_name: &str) {
        self.cache.invalidate_category(category_name);
    }

    /// Administrative/test reset.
    pub fn clear(&self) {
        self.cache.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn category(name: &str, dir: &str) -> Category {
        Category {
            name: name.to_string(),
            dir: dir.to_string(),
            patterns: vec!["*.md".to_string()],
            description: String::new(),
        }
    }

    fn lookup_for(root: &Path) -> DocumentLookup {
        DocumentLookup::new(
            Arc::new(PathValidator::new(vec![root.to_path_buf()])),
            Arc::new(DocumentExistenceCache::new()),
            GlobLimits::default(),
        )
    }

    #[tokio::test]
    async fn test_find_document() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("guide");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("setup.md"), "setup").unwrap();

        let lookup = lookup_for(temp.path());
        let matches = lookup
            .find_document(temp.path(), &category("guide", "guide"), "setup")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("setup.md"));
    }

    #[tokio::test]
    async fn test_find_document_absent() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("guide");
        fs::create_dir(&docs).unwrap();

        let lookup = lookup_for(temp.path());
        let found = lookup
            .find_document(temp.path(), &category("guide", "guide"), "setup")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_repeated_lookups_glob_once() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("guide");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("setup.md"), "setup").unwrap();

        let lookup = lookup_for(temp.path());
        let cat = category("guide", "guide");

        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_some());

        // Remove the file; the cached answer must keep serving until the
        // category is invalidated
        fs::remove_file(docs.join("setup.md")).unwrap();
        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_some());

        lookup.invalidate("guide");
        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_negative_answers_are_cached_too() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("guide");
        fs::create_dir(&docs).unwrap();

        let lookup = lookup_for(temp.path());
        let cat = category("guide", "guide");

        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_none());

        // The document appears on disk, but the negative entry holds until
        // invalidation
        fs::write(docs.join("setup.md"), "setup").unwrap();
        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_none());

        lookup.invalidate("guide");
        assert!(lookup
            .find_document(temp.path(), &cat, "setup")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_category_dir_outside_docroot_rejected() {
        let temp = tempdir().unwrap();
        let lookup = lookup_for(temp.path());

        let err = lookup
            .find_document(temp.path(), &category("evil", "../../etc"), "passwd")
            .await
            .unwrap_err();
        assert!(err.is_security());
    }

    #[tokio::test]
    async fn test_list_documents() {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("guide");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.md"), "a").unwrap();
        fs::write(docs.join("b.md"), "b").unwrap();
        fs::write(docs.join("notes.txt"), "notes").unwrap();

        let lookup = lookup_for(temp.path());
        let documents = lookup
            .list_documents(temp.path(), &category("guide", "guide"))
            .await
            .unwrap();
        assert_eq!(documents.len(), 2);
    }
}
