//! Local file cache
//!
//! A flat directory with one file per uploaded filename. Writes go to a
//! temporary sibling and are renamed into place, so concurrent uploads of the
//! same name resolve to last-writer-wins and readers never see partial data.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache file name: {0:?}")]
    InvalidName(String),

    #[error("Cache I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of the best-effort cache write that accompanies an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWriteOutcome {
    Written { path: PathBuf, bytes: usize },
    Failed { reason: String },
}

impl CacheWriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, CacheWriteOutcome::Written { .. })
    }
}

/// Directory-backed cache keyed by original filename
#[derive(Debug, Clone)]
pub struct LocalFileCache {
    root: PathBuf,
}

impl LocalFileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reduce a client-supplied filename to a safe key inside the cache.
    ///
    /// Only the final path component survives (both `/` and `\` separate).
    /// Empty names, `.`/`..`, dot-files and names containing NUL are rejected.
    pub fn cache_key(filename: &str) -> Option<&str> {
        let base = filename
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or("")
            .trim();
        if base.is_empty() || base.starts_with('.') || base.contains('\0') {
            return None;
        }
        Some(base)
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, CacheError> {
        Self::cache_key(filename)
            .map(|key| self.root.join(key))
            .ok_or_else(|| CacheError::InvalidName(filename.to_string()))
    }

    /// Write `content` under `filename`, replacing any previous copy.
    pub async fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, CacheError> {
        let target = self.path_for(filename)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CacheError::Io {
                path: self.root.clone(),
                source,
            })?;

        let key = Self::cache_key(filename).unwrap_or_default();
        let temp = self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        if let Err(source) = tokio::fs::write(&temp, content).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(CacheError::Io { path: temp, source });
        }

        if let Err(source) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(CacheError::Io {
                path: target,
                source,
            });
        }

        debug!("Saved file locally to {}", target.display());
        Ok(target)
    }

    /// Best-effort variant of [`write`](Self::write): failures are logged and
    /// reported, never raised.
    pub async fn store(&self, filename: &str, content: &[u8]) -> CacheWriteOutcome {
        match self.write(filename, content).await {
            Ok(path) => CacheWriteOutcome::Written {
                path,
                bytes: content.len(),
            },
            Err(e) => {
                warn!("Local cache write failed for {:?}: {}", filename, e);
                CacheWriteOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Read a cached copy. `Ok(None)` means nothing is cached under that name.
    pub async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }
}
