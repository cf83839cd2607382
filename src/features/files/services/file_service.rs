use axum::body::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::features::files::models::{UploadOutcome, UploadedFile};
use crate::modules::provider::{
    normalize_file_reference, FileHandle, GenerativeProvider, ProviderError, ProviderFile,
};
use crate::modules::storage::{CacheWriteOutcome, LocalFileCache};

/// Provider-backed file operations plus the local cache
pub struct FileService {
    provider: Arc<dyn GenerativeProvider>,
    cache: LocalFileCache,
    list_page_size: u32,
}

impl FileService {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        cache: LocalFileCache,
        list_page_size: u32,
    ) -> Self {
        Self {
            provider,
            cache,
            list_page_size: list_page_size.max(1),
        }
    }

    /// Upload a file to the provider and keep a local copy for viewing
    ///
    /// # Arguments
    /// * `filename` - The original filename, also used as the provider display name
    /// * `mime_type` - The MIME type of the file
    /// * `content` - The file content as bytes
    ///
    /// # Returns
    /// The uploaded file handle and the outcome of the local cache write
    pub async fn upload_file(
        &self,
        filename: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<UploadOutcome, ProviderError> {
        let size = content.len();
        let provider_file = self
            .provider
            .upload_file(filename, mime_type, content.clone())
            .await?;

        info!(
            "File uploaded to provider: name={}, filename={}, size={}, state={:?}",
            provider_file.name, filename, size, provider_file.state
        );

        let cache = self.cache.store(filename, &content).await;
        match &cache {
            CacheWriteOutcome::Written { path, bytes } => {
                debug!("Cached {} bytes at {}", bytes, path.display())
            }
            CacheWriteOutcome::Failed { reason } => {
                debug!("Upload kept without a local copy: {}", reason)
            }
        }

        Ok(UploadOutcome {
            file: UploadedFile::from_provider(filename, mime_type, provider_file),
            cache,
        })
    }

    /// Resolve caller references to files usable for grounding.
    ///
    /// References that cannot be fetched or are not ACTIVE are dropped with a
    /// warning. Order is kept; repeated references are attached once.
    pub async fn resolve_files(&self, references: &[String]) -> Vec<FileHandle> {
        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(references.len());

        for reference in references {
            let normalized = normalize_file_reference(reference);
            if normalized.trim().is_empty() {
                warn!("Empty file reference. Skipping.");
                continue;
            }
            if normalized != *reference {
                debug!("Extracted ID {} from URI {}", normalized, reference);
            }
            if !seen.insert(normalized.clone()) {
                continue;
            }

            let file = match self.provider.get_file(&normalized).await {
                Ok(file) => file,
                Err(e) => {
                    warn!("Could not get file {}: {}. Skipping.", normalized, e);
                    continue;
                }
            };

            match FileHandle::try_from(file) {
                Ok(handle) => {
                    debug!("Attaching file {} ({})", handle.name, handle.mime_type);
                    handles.push(handle);
                }
                Err(file) => warn!(
                    "File {} is not ACTIVE (state: {:?}). Skipping.",
                    file.name, file.state
                ),
            }
        }

        debug!(
            "Resolved {} of {} file references",
            handles.len(),
            references.len()
        );
        handles
    }

    /// List every file in the account, following pagination to the end
    pub async fn list_files(&self) -> Result<Vec<ProviderFile>, ProviderError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .provider
                .list_files(self.list_page_size, page_token.as_deref())
                .await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if Some(&token) != page_token.as_ref() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} provider files", files.len());
        Ok(files)
    }

    /// Fetch a single file record
    pub async fn get_file(&self, reference: &str) -> Result<ProviderFile, ProviderError> {
        self.provider
            .get_file(&normalize_file_reference(reference))
            .await
    }

    /// Delete a file on the provider. Unknown files are an error.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), ProviderError> {
        let name = normalize_file_reference(file_id);
        debug!("Deleting file {}", name);

        self.provider.delete_file(&name).await.inspect_err(|e| {
            warn!("Error deleting file {}: {}", file_id, e);
        })?;

        info!("File deleted from provider: {}", name);
        Ok(())
    }

    /// Raw bytes of the locally cached copy. Cache errors read as a miss.
    pub async fn read_cached(&self, filename: &str) -> Option<Vec<u8>> {
        match self.cache.read(filename).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Local cache read failed for {:?}: {}", filename, e);
                None
            }
        }
    }
}
