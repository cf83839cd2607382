//! Generative-language provider integration
//!
//! [`GenerativeProvider`] is the seam between the services and the external
//! provider. [`GeminiClient`] talks to the Gemini REST API; tests substitute
//! an in-memory implementation.

mod error;
mod gemini;
mod reference;
mod types;

use async_trait::async_trait;
use axum::body::Bytes;

pub use error::{ProviderError, ProviderErrorKind};
pub use gemini::GeminiClient;
pub use reference::{file_resource_name, normalize_file_reference};
pub use types::{
    Content, Conversation, FileHandle, FilePage, FileState, GenerateRequest, Part, ProviderFile,
    Role,
};

/// File storage and grounded generation offered by the provider.
///
/// File arguments accept a resource name (`files/<id>`), a bare id or a full
/// file URI.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Ingest raw bytes. The returned record is usually still PENDING.
    async fn upload_file(
        &self,
        display_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<ProviderFile, ProviderError>;

    async fn get_file(&self, name: &str) -> Result<ProviderFile, ProviderError>;

    /// Fetch one page of the account's files.
    async fn list_files(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<FilePage, ProviderError>;

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError>;

    /// Run a generation and return the reply text.
    async fn generate_content(&self, request: GenerateRequest) -> Result<String, ProviderError>;
}
