//! HTTP content cache with conditional-request revalidation.
//!
//! Each URL moves through Absent -> Fresh -> Stale -> (Fresh again after a
//! 304/200, or Stale-Fallback when the origin is unreachable). Entries are
//! replaced wholesale after a complete response - never mutated in place -
//! so a cancelled in-flight request can never leave a half-written entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{CacheConfig, CoreConfig};
use crate::error::AccessError;
use crate::file::source::FileSource;
use crate::http::client::HttpClient;
use crate::http::fetch::{FetchOutcome, FetchResponse, RemoteFetch};

/// Parsed Cache-Control directives, extracted once when an entry is stored.
#[derive(Debug, Clone, Default)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub max_age: Option<Duration>,
}

impl CacheControl {
    pub fn parse(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Self::default();
        };

        let mut parsed = Self::default();
        for directive in header.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            if directive == "no-cache" {
                parsed.no_cache = true;
            } else if directive == "no-store" {
                parsed.no_store = true;
            } else if let Some(value) = directive.strip_prefix("max-age=") {
                if let Ok(secs) = value.trim().parse::<u64>() {
                    parsed.max_age = Some(Duration::from_secs(secs));
                }
            }
        }
        parsed
    }
}

/// One cached HTTP representation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    content: String,
    etag: Option<String>,
    last_modified: Option<String>,
    cache_control: CacheControl,
    cached_at: Instant,
}

impl CacheEntry {
    fn from_response(response: &FetchResponse) -> Self {
        Self {
            content: response.content.clone(),
            etag: response.etag.clone(),
            last_modified: response.last_modified.clone(),
            cache_control: CacheControl::parse(response.cache_control.as_deref()),
            cached_at: Instant::now(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Whether this entry must be revalidated before being served.
    ///
    /// `no-cache`/`no-store` always revalidate; a `max-age` directive is
    /// authoritative once present; entries carrying validators (ETag or
    /// Last-Modified) stay fresh for `freshness_window`; entries with
    /// neither directives nor validators revalidate unconditionally.
    pub fn needs_validation(&self, freshness_window: Duration) -> bool {
        if self.cache_control.no_cache || self.cache_control.no_store {
            return true;
        }

        let age = self.cached_at.elapsed();
        if let Some(max_age) = self.cache_control.max_age {
            return age > max_age;
        }

        if self.etag.is_some() || self.last_modified.is_some() {
            return age > freshness_window;
        }

        true
    }

    /// A copy of this entry restamped as just-validated (after a 304).
    fn revalidated(&self) -> Self {
        Self {
            cached_at: Instant::now(),
            ..self.clone()
        }
    }

    #[cfg(test)]
    fn backdated(response: &FetchResponse, age: Duration) -> Self {
        let mut entry = Self::from_response(response);
        if let Some(at) = Instant::now().checked_sub(age) {
            entry.cached_at = at;
        }
        entry
    }
}

/// Conditional-request cache over a [`RemoteFetch`] transport.
///
/// The map lock is never held across network I/O: two concurrent reads of an
/// Absent key may both fetch (at-most-duplicate-work), but neither can ever
/// observe a partially-written entry.
pub struct RemoteContentCache {
    entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
    fetcher: Arc<dyn RemoteFetch>,
    freshness_window: Duration,
}

impl RemoteContentCache {
    pub fn new(fetcher: Arc<dyn RemoteFetch>, config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fetcher,
            freshness_window: config.freshness_window(),
        }
    }

    /// Cache wired to the reqwest-backed transport.
    pub fn with_http_client(config: &CoreConfig) -> Self {
        Self::new(Arc::new(HttpClient::new(&config.http)), &config.cache)
    }

    pub fn get(&self, url: &str) -> Option<Arc<CacheEntry>> {
        self.entries.lock().unwrap().get(url).cloned()
    }

    pub fn put(&self, url: &str, response: &FetchResponse) {
        self.store(url, CacheEntry::from_response(response));
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn store(&self, url: &str, entry: CacheEntry) {
        self.entries
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::new(entry));
    }

    /// Read `url`, serving from cache when fresh, revalidating when stale,
    /// and falling back to stale content when the origin is unreachable.
    /// The error propagates only when there is no cache entry at all.
    pub async fn read(&self, url: &str, source: &FileSource) -> Result<String, AccessError> {
        let cached = if source.cache_enabled {
            self.get(url)
        } else {
            None
        };

        // A per-source TTL can tighten the validator freshness window, never
        // extend it.
        let window = source.cache_ttl.min(self.freshness_window);

        if let Some(entry) = cached {
            if !entry.needs_validation(window) {
                debug!("Serving fresh cache entry for {url}");
                return Ok(entry.content().to_string());
            }
            return self.revalidate(url, source, &entry).await;
        }

        // Nothing cached: unconditional fetch with nothing to fall back on.
        let response = self
            .fetcher
            .get(url, &source.auth_headers)
            .await
            .map_err(|e| AccessError::Network {
                url: url.to_string(),
                source: e,
            })?;

        let content = response.content.clone();
        if source.cache_enabled {
            self.put(url, &response);
        }
        Ok(content)
    }

    async fn revalidate(
        &self,
        url: &str,
        source: &FileSource,
        entry: &Arc<CacheEntry>,
    ) -> Result<String, AccessError> {
        let outcome = self
            .fetcher
            .get_conditional(
                url,
                &source.auth_headers,
                entry.etag(),
                entry.last_modified(),
            )
            .await;

        match outcome {
            Ok(FetchOutcome::NotModified) => {
                debug!("Origin reports {url} unchanged");
                self.store(url, entry.revalidated());
                Ok(entry.content().to_string())
            }
            Ok(FetchOutcome::Modified(response)) => {
                debug!("Origin sent new content for {url}");
                let content = response.content.clone();
                self.put(url, &response);
                Ok(content)
            }
            Err(e) => {
                warn!("Revalidation of {url} failed, serving stale content: {e:#}");
                Ok(entry.content().to_string())
            }
        }
    }

    /// HEAD probe through the same transport.
    pub async fn probe(&self, url: &str, source: &FileSource) -> Result<bool, AccessError> {
        self.fetcher
            .head(url, &source.auth_headers)
            .await
            .map_err(|e| AccessError::Network {
                url: url.to_string(),
                source: e,
            })
    }
}
