use std::collections::HashMap;
use std::time::Duration;

use crate::error::AccessError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Local,
    Http,
}

/// Where a content request is served from.
///
/// Immutable once constructed; created per request and never persisted. The
/// `base_path` is a directory path for [`SourceKind::Local`] and a full URL
/// for [`SourceKind::Http`].
#[derive(Debug, Clone)]
pub struct FileSource {
    pub kind: SourceKind,
    pub base_path: String,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub auth_headers: HashMap<String, String>,
}

impl FileSource {
    fn new(kind: SourceKind, base_path: impl Into<String>) -> Self {
        Self {
            kind,
            base_path: base_path.into(),
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            auth_headers: HashMap::new(),
        }
    }

    /// Parse a URI-like string into a source.
    ///
    /// `file://` maps to Local (with `file:///abs` keeping the absolute
    /// path), `http://`/`https://` map to Http with the full URL as base,
    /// and unprefixed strings default to Local. Any other scheme is a
    /// construction error.
    pub fn parse(uri: &str) -> Result<Self, AccessError> {
        if let Some(rest) = uri.strip_prefix("file://") {
            return Ok(Self::new(SourceKind::Local, rest));
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(Self::new(SourceKind::Http, uri));
        }
        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(AccessError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }
        Ok(Self::new(SourceKind::Local, uri))
    }

    pub fn with_auth_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.auth_headers = headers;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_disabled(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}
