//! Depth-limited, symlink-safe glob search.
//!
//! Faults are absorbed per candidate: a broken symlink, a pattern that fails
//! to compile, or a match that escapes the search root shrinks the result
//! set, it never aborts the search. One bad file must not break an entire
//! listing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::GlobLimits;

/// Search `search_dir` for files matching `patterns` (recursive `**`
/// supported). Returns an ordered, de-duplicated list of canonical absolute
/// paths, each verified to lie under `search_dir`.
///
/// A pattern that matches nothing and does not already name a `.md` file is
/// retried with `.md` appended, so `"setup"` finds `setup.md`. Exact matches
/// always outrank fallback matches because the fallback only runs when the
/// exact pass produced nothing.
pub fn search(search_dir: &Path, patterns: &[String], limits: &GlobLimits) -> Vec<PathBuf> {
    let root = search_dir
        .canonicalize()
        .unwrap_or_else(|_| search_dir.to_path_buf());

    let mut matched = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        if matched.len() >= limits.max_documents {
            warn!(
                "Reached maximum document limit ({}) for glob search",
                limits.max_documents
            );
            break;
        }

        let found = run_pattern(&root, pattern, limits, &mut matched, &mut seen);

        if !found && !pattern.ends_with(".md") {
            let fallback = format!("{pattern}.md");
            run_pattern(&root, &fallback, limits, &mut matched, &mut seen);
        }
    }

    matched
}

/// Run one pattern, appending accepted candidates. Returns whether the glob
/// yielded anything at all (accepted or not), which drives the extension
/// fallback.
fn run_pattern(
    root: &Path,
    pattern: &str,
    limits: &GlobLimits,
    matched: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) -> bool {
    let pattern_path = root.join(pattern);
    let entries = match glob::glob(&pattern_path.to_string_lossy()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Glob pattern '{pattern}' failed: {e}");
            return false;
        }
    };

    let mut any_matches = false;
    for entry in entries {
        any_matches = true;

        if matched.len() >= limits.max_documents {
            warn!(
                "Reached maximum document limit ({}) for glob search",
                limits.max_documents
            );
            break;
        }

        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable glob match: {e}");
                continue;
            }
        };

        if !path.is_file() {
            continue;
        }

        let resolved = match path.canonicalize() {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Failed to resolve {}: {e}", path.display());
                continue;
            }
        };

        if seen.contains(&resolved) {
            continue;
        }

        // A symlink inside the tree can point anywhere; only the canonical
        // target's location counts.
        let relative = match resolved.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => {
                debug!(
                    "Skipping file outside search directory: {}",
                    resolved.display()
                );
                continue;
            }
        };

        let depth = relative.components().count().saturating_sub(1);
        if depth > limits.max_depth {
            continue;
        }

        seen.insert(resolved.clone());
        matched.push(resolved);
    }

    any_matches
}
