//! Unified access to local and remote document content.
//!
//! `source.rs` parses URI-like strings into a tagged [`FileSource`] value;
//! `accessor.rs` dispatches reads and existence checks on the source kind,
//! boundary-validating every local touch and routing remote reads through
//! the HTTP cache; `glob_search.rs` is the depth-limited, symlink-safe
//! pattern search used for document discovery.

pub mod accessor;
pub mod glob_search;
pub mod source;

pub use accessor::FileAccessor;
pub use source::{FileSource, SourceKind};
