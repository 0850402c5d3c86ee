use std::collections::HashMap;

use anyhow::Result;

/// A complete (non-304) HTTP response, reduced to the fields the cache layer
/// consumes. Header values are extracted case-insensitively by the
/// implementation.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub content: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub cache_control: Option<String>,
}

/// Outcome of a conditional GET.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 200: the origin sent new content.
    Modified(FetchResponse),
    /// 304: the cached representation is still current.
    NotModified,
}

/// Transport seam between the content cache and the network.
///
/// The production implementation is [`crate::http::HttpClient`]; tests
/// substitute a scripted mock so the cache state machine can be exercised
/// without a live origin.
#[async_trait::async_trait]
pub trait RemoteFetch: Send + Sync {
    /// Unconditional GET.
    async fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<FetchResponse>;

    /// Conditional GET carrying the cached entry's validators as
    /// `If-None-Match` / `If-Modified-Since`.
    async fn get_conditional(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome>;

    /// HEAD probe. `Ok(true)` when the origin reports the resource present,
    /// `Ok(false)` on 404.
    async fn head(&self, url: &str, headers: &HashMap<String, String>) -> Result<bool>;
}
