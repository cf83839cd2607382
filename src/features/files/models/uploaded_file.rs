use crate::modules::provider::{FileState, ProviderFile};
use crate::modules::storage::CacheWriteOutcome;

/// Handle to a file accepted by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original filename as sent by the client
    pub filename: String,
    /// Provider URI of the file
    pub provider_file_id: String,
    /// Provider resource name, `files/<id>`
    pub name: String,
    pub mime_type: String,
    pub state: FileState,
}

impl UploadedFile {
    pub fn from_provider(filename: &str, mime_type: &str, file: ProviderFile) -> Self {
        Self {
            filename: filename.to_string(),
            provider_file_id: file.uri,
            name: file.name,
            mime_type: mime_type.to_string(),
            state: file.state,
        }
    }
}

/// Upload result: the provider-side file plus the separate outcome of the
/// local cache write. A failed cache write never affects `file`.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file: UploadedFile,
    pub cache: CacheWriteOutcome,
}
