use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::debug;

use crate::cache::remote::RemoteContentCache;
use crate::error::AccessError;
use crate::file::source::{FileSource, SourceKind};
use crate::security::PathValidator;

/// Dispatches content requests on the source kind.
///
/// Every local path is boundary-validated before it is touched; every remote
/// read goes through the conditional-request cache. The two paths share no
/// lock, so a hung origin cannot block local reads.
#[derive(Clone)]
pub struct FileAccessor {
    validator: Arc<PathValidator>,
    remote: Arc<RemoteContentCache>,
}

impl FileAccessor {
    pub fn new(validator: Arc<PathValidator>, remote: Arc<RemoteContentCache>) -> Self {
        Self { validator, remote }
    }

    /// Join a relative path onto the source's base: URL join for Http,
    /// filesystem join for Local.
    pub fn resolve_path(&self, relative: &str, source: &FileSource) -> String {
        match source.kind {
            SourceKind::Http => format!(
                "{}/{}",
                source.base_path.trim_end_matches('/'),
                relative.trim_start_matches('/')
            ),
            SourceKind::Local => Path::new(&source.base_path)
                .join(relative)
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// Check whether a file exists.
    ///
    /// Local sources do a boundary-validated stat. Http sources answer an
    /// optimistic `true` without a network round trip; a false positive
    /// surfaces on the subsequent read. Use [`Self::exists_remote`] when
    /// the origin must actually be consulted.
    pub async fn exists(&self, relative: &str, source: &FileSource) -> Result<bool, AccessError> {
        match source.kind {
            SourceKind::Http => Ok(true),
            SourceKind::Local => {
                let path = self.validate_local(relative, source)?;
                Ok(fs::try_exists(&path).await.unwrap_or(false))
            }
        }
    }

    /// Existence check that actually asks the origin (HEAD) for Http
    /// sources. Local sources behave exactly like [`Self::exists`].
    pub async fn exists_remote(
        &self,
        relative: &str,
        source: &FileSource,
    ) -> Result<bool, AccessError> {
        match source.kind {
            SourceKind::Http => {
                let url = self.resolve_path(relative, source);
                self.remote.probe(&url, source).await
            }
            SourceKind::Local => self.exists(relative, source).await,
        }
    }

    /// Read a file as text.
    pub async fn read_file(
        &self,
        relative: &str,
        source: &FileSource,
    ) -> Result<String, AccessError> {
        match source.kind {
            SourceKind::Http => {
                let url = self.resolve_path(relative, source);
                self.remote.read(&url, source).await
            }
            SourceKind::Local => {
                let path = self.validate_local(relative, source)?;
                debug!("Reading local file {}", path.display());
                read_local(&path).await
            }
        }
    }

    fn validate_local(
        &self,
        relative: &str,
        source: &FileSource,
    ) -> Result<PathBuf, AccessError> {
        self.validator
            .validate(relative, Path::new(&source.base_path))
    }
}

async fn read_local(path: &Path) -> Result<String, AccessError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AccessError::NotFound {
            path: path.display().to_string(),
        }),
        Err(e) => Err(AccessError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}
