use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::files::models::UploadOutcome;
use crate::modules::provider::{FileState, ProviderFile};

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for uploads
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileUploadResponseDto {
    /// Original filename as uploaded
    #[schema(example = "report.pdf")]
    pub filename: String,
    /// File reference to pass back in chat requests (same value as `uri`)
    pub file_id: String,
    /// MIME type of the file
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// Provider URI of the file
    pub uri: String,
    /// Provider resource name, stable short identifier
    #[schema(example = "files/abc123")]
    pub name: String,
    /// Processing state right after upload, usually PENDING
    pub state: FileState,
    /// Whether a local copy is available under `/files/view/{filename}`
    pub cached: bool,
}

impl From<UploadOutcome> for FileUploadResponseDto {
    fn from(outcome: UploadOutcome) -> Self {
        let file = outcome.file;
        Self {
            filename: file.filename,
            file_id: file.provider_file_id.clone(),
            mime_type: file.mime_type,
            uri: file.provider_file_id,
            name: file.name,
            state: file.state,
            cached: outcome.cache.is_written(),
        }
    }
}

/// File record as listed by the provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileRecordDto {
    #[schema(example = "files/abc123")]
    pub name: String,
    #[schema(example = "report.pdf")]
    pub display_name: Option<String>,
    pub uri: String,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
    /// ISO-8601 creation time, null if unknown
    pub create_time: Option<DateTime<Utc>>,
    pub state: FileState,
}

impl From<ProviderFile> for FileRecordDto {
    fn from(file: ProviderFile) -> Self {
        Self {
            name: file.name,
            display_name: file.display_name,
            uri: file.uri,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            create_time: file.create_time,
            state: file.state,
        }
    }
}
