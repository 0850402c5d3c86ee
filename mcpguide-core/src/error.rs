use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for content resolution.
///
/// `Security` is always fatal for the request that raised it and is never
/// downgraded to a warning. `Network` degrades to stale-cache serving when a
/// cached entry exists; it only reaches callers when there is nothing to
/// fall back on. Per-candidate faults during glob scanning (broken symlinks,
/// bad patterns, depth overflow) are not errors at all - they are logged and
/// shrink the result set.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Path outside allowed boundaries: {path}")]
    Security { path: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unsupported URL scheme: {scheme}://")]
    UnsupportedScheme { scheme: String },
}

impl AccessError {
    pub fn is_security(&self) -> bool {
        matches!(self, AccessError::Security { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::Security { .. } => "SecurityError",
            AccessError::NotFound { .. } => "NotFound",
            AccessError::Io { .. } => "IOError",
            AccessError::Network { .. } => "NetworkError",
            AccessError::UnsupportedScheme { .. } => "UnsupportedScheme",
        }
    }
}

/// Structured failure handed to protocol-layer callers instead of raising
/// through them.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(error: &AccessError) -> Self {
        Self {
            success: false,
            error_code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success,
            "error_code": self.error_code,
            "message": self.message,
        })
    }
}
