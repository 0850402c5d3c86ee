use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the content resolution core. Every field has a default so an
/// absent or partial config file still yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    #[serde(default)]
    pub glob: GlobLimits,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl CoreConfig {
    /// Load configuration from a YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {path:?}"))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {path:?}"))
    }
}

/// Safety limits for glob searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobLimits {
    /// Maximum path-segment depth below the search root; deeper matches are
    /// silently excluded.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Hard cap on matches returned by a single search.
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

impl Default for GlobLimits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_documents: default_max_documents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Responses larger than this are refused rather than cached.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: usize,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_content_length: default_max_content_length(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window for cached HTTP entries that carry validators (ETag
    /// or Last-Modified) but no max-age directive.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
}

impl CacheConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
        }
    }
}

fn default_max_depth() -> usize {
    8
}

fn default_max_documents() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_content_length() -> usize {
    10_000_000
}

fn default_rate_limit_requests() -> usize {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_freshness_window_secs() -> u64 {
    300
}
