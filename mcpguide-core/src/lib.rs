pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod security;

// Public library API - the server layers (MCP tools, config CRUD) consume
// the core through these types.
pub use cache::{DocumentExistenceCache, RemoteContentCache};
pub use category::{Category, DocumentLookup};
pub use config::CoreConfig;
pub use error::{AccessError, ErrorResponse};
pub use file::{FileAccessor, FileSource, SourceKind};
pub use http::{HttpClient, RemoteFetch};
pub use security::{sanitize_filename, PathValidator};
