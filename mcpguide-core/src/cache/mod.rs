//! In-process caches.
//!
//! `remote.rs` holds the HTTP conditional-request cache (ETag /
//! Last-Modified / Cache-Control staleness policy); `document.rs` holds the
//! document-existence cache invalidated on category mutation. Each is owned
//! by a single process-scoped instance passed by reference to its consumers,
//! never ambient module state.

pub mod document;
pub mod remote;

pub use document::{DocumentCacheEntry, DocumentExistenceCache};
pub use remote::{CacheControl, CacheEntry, RemoteContentCache};
