use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::HttpConfig;
use crate::http::fetch::{FetchOutcome, FetchResponse, RemoteFetch};

/// Sliding-window request limiter.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Record a request, failing if the window is already full.
    pub fn check(&self) -> Result<()> {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();
        requests.retain(|at| now.duration_since(*at) < self.window);

        if requests.len() >= self.max_requests {
            bail!(
                "Rate limit exceeded: {} requests per {}s",
                self.max_requests,
                self.window.as_secs()
            );
        }

        requests.push(now);
        Ok(())
    }
}

/// reqwest-backed [`RemoteFetch`] with request hygiene: scheme and host
/// checks before every request, a loopback refusal, bounded redirects, a
/// total timeout, a response size cap, and rate limiting.
pub struct HttpClient {
    client: Client,
    limiter: RateLimiter,
    max_content_length: usize,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            limiter: RateLimiter::new(config.rate_limit_requests, config.rate_limit_window()),
            max_content_length: config.max_content_length,
        }
    }

    fn checked_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Invalid URL scheme: {}", parsed.scheme());
        }
        let Some(host) = parsed.host_str() else {
            bail!("URL must have a valid hostname");
        };
        if matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]") {
            bail!("Access to localhost is not allowed");
        }

        Ok(parsed)
    }

    fn auth_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {name}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {name}"))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<FetchResponse> {
        let etag = header_string(&response, &ETAG);
        let last_modified = header_string(&response, &LAST_MODIFIED);
        let cache_control = header_string(&response, &CACHE_CONTROL);

        if let Some(length) = response.content_length() {
            if length as usize > self.max_content_length {
                bail!("Response too large: {length} bytes");
            }
        }

        let content = response
            .text()
            .await
            .context("Failed to read response body")?;
        if content.len() > self.max_content_length {
            bail!("Response too large: {} bytes", content.len());
        }

        Ok(FetchResponse {
            content,
            etag,
            last_modified,
            cache_control,
        })
    }
}

#[async_trait::async_trait]
impl RemoteFetch for HttpClient {
    async fn get(&self, url: &str, headers: &HashMap<String, String>) -> Result<FetchResponse> {
        let url = Self::checked_url(url)?;
        self.limiter.check()?;

        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .headers(Self::auth_headers(headers)?)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Request to {url} failed"))?;

        self.read_body(response).await
    }

    async fn get_conditional(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome> {
        let url = Self::checked_url(url)?;
        self.limiter.check()?;

        let mut request = self
            .client
            .get(url.clone())
            .headers(Self::auth_headers(headers)?);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }

        debug!("Conditional GET {url}");
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("Request to {url} failed"))?;
        Ok(FetchOutcome::Modified(self.read_body(response).await?))
    }

    async fn head(&self, url: &str, headers: &HashMap<String, String>) -> Result<bool> {
        let url = Self::checked_url(url)?;
        self.limiter.check()?;

        debug!("HEAD {url}");
        let response = self
            .client
            .head(url.clone())
            .headers(Self::auth_headers(headers)?)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("Request to {url} failed"))?;
        Ok(response.status().is_success())
    }
}

fn header_string(response: &reqwest::Response, name: &HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
