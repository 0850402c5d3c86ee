//! Path validation and filename sanitization.
//!
//! Every filesystem path this crate ever opens or returns has passed through
//! [`PathValidator::validate`]: canonicalized (symlinks followed, `.`/`..`
//! eliminated) and verified to lie under at least one allowed root.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::AccessError;

/// Validates candidate paths against a fixed set of allowed root directories.
///
/// Roots are canonicalized once at construction and immutable afterwards. An
/// empty root set rejects every path.
#[derive(Debug, Clone)]
pub struct PathValidator {
    allowed_roots: Vec<PathBuf>,
}

impl PathValidator {
    /// Create a validator for the given roots. Roots that cannot be
    /// canonicalized (typically: they do not exist) are skipped with a
    /// warning rather than failing construction.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let allowed_roots = roots
            .into_iter()
            .filter_map(|root| match root.canonicalize() {
                Ok(canonical) => Some(canonical),
                Err(e) => {
                    warn!("Skipping allowed root {}: {e}", root.display());
                    None
                }
            })
            .collect();

        Self { allowed_roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.allowed_roots
    }

    /// Resolve `candidate` (joined onto `base` if relative) to its canonical
    /// form and verify it lies under one of the allowed roots.
    ///
    /// Cross-root references are legitimate: `../other_root/file` validates
    /// as long as the canonical result lands inside *some* root. Everything
    /// else - absolute injection, traversal that escapes, a symlink whose
    /// target points outside - fails with [`AccessError::Security`].
    pub fn validate(&self, candidate: &str, base: &Path) -> Result<PathBuf, AccessError> {
        let normalized = candidate.replace('\\', "/");
        let candidate_path = PathBuf::from(&normalized);

        let joined = if candidate_path.is_absolute() {
            candidate_path
        } else {
            base.join(candidate_path)
        };

        let resolved = canonicalize_lenient(&joined).map_err(|_| AccessError::Security {
            path: joined.display().to_string(),
        })?;

        if self
            .allowed_roots
            .iter()
            .any(|root| resolved.starts_with(root))
        {
            Ok(resolved)
        } else {
            Err(AccessError::Security {
                path: resolved.display().to_string(),
            })
        }
    }
}

/// Canonicalize a path that may not exist yet.
///
/// `std::fs::canonicalize` fails on missing paths, but existence checks need
/// to validate paths for files that are merely absent. Resolve the nearest
/// existing ancestor and reattach the missing tail. The tail cannot contain
/// `..`: with nothing on disk to resolve symlinks against, traversal there
/// is not verifiable and is refused.
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut existing = path;
            let mut tail = Vec::new();

            loop {
                let name = existing.file_name().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "unresolvable path tail")
                })?;
                tail.push(name.to_os_string());

                existing = existing
                    .parent()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"))?;
                if existing.as_os_str().is_empty() {
                    return Err(io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"));
                }
                if existing.exists() {
                    break;
                }
            }

            let mut resolved = existing.canonicalize()?;
            for name in tail.iter().rev() {
                resolved.push(name);
            }
            Ok(resolved)
        }
        Err(e) => Err(e),
    }
}

/// Replace characters that are unsafe in filenames with underscores.
///
/// Path separators, `:`, wildcards, quotes, and angle brackets become `_`;
/// traversal dot-runs are dropped; an empty or all-dot/whitespace result
/// collapses to `"unnamed"`.
pub fn sanitize_filename(name: &str) -> String {
    const UNSAFE: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return "unnamed".to_string();
    }

    let replaced: String = trimmed
        .chars()
        .map(|c| if UNSAFE.contains(&c) { '_' } else { c })
        .collect();

    // Drop runs of two or more dots (traversal sequences)
    let mut no_traversal = String::with_capacity(replaced.len());
    let mut chars = replaced.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '.' && chars.peek() == Some(&'.') {
            while chars.peek() == Some(&'.') {
                chars.next();
            }
            continue;
        }
        no_traversal.push(c);
    }

    let stripped = no_traversal.trim_matches(|c| c == '.' || c == ' ');

    // Collapse runs of underscores left behind by replacement
    let mut collapsed = String::with_capacity(stripped.len());
    let mut last_was_underscore = false;
    for c in stripped.chars() {
        if c == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        collapsed.push(c);
    }

    let result = collapsed.trim_matches('_');
    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}
