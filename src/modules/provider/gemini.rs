//! Gemini REST client
//!
//! Covers the Files API (resumable upload, get, list, delete) and
//! `models/{model}:generateContent`.
//!
//! API reference: <https://ai.google.dev/api/files>

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{ProviderError, ProviderErrorKind};
use super::reference::file_resource_name;
use super::types::{
    Content, FilePage, FileState, GenerateRequest, Part, ProviderFile, Role,
};
use super::GenerativeProvider;
use crate::core::config::GeminiConfig;
use crate::shared::constants::FILE_RESOURCE_PREFIX;

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini REST client
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::Transport,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    /// `files/<id>` with the id percent-encoded for use in a URL path
    fn file_path(reference: &str) -> String {
        let name = file_resource_name(reference);
        let id = name.strip_prefix(FILE_RESOURCE_PREFIX).unwrap_or(&name);
        format!("{}{}", FILE_RESOURCE_PREFIX, urlencoding::encode(id))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    /// Send a request, turning transport failures and non-2xx answers into
    /// [`ProviderError`].
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ProviderError> {
        let response = builder.send().await.map_err(|e| {
            warn!("Gemini request failed: {}", e);
            ProviderError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Gemini returned status {}: {}", status, body);
        Err(ProviderError::from_response(status, &body))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = self.execute(builder).await?;
        response.json::<T>().await.map_err(|e| {
            ProviderError::invalid_response(format!("Failed to parse Gemini response: {}", e))
        })
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn upload_file(
        &self,
        display_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<ProviderFile, ProviderError> {
        // Resumable protocol: the start call returns a session URL that
        // receives the bytes in a single upload+finalize call.
        let start_url = format!("{}/upload/{}/files", self.base_url, API_VERSION);
        let metadata = UploadMetadata {
            file: UploadFileMetadata { display_name },
        };

        debug!(
            "Starting Gemini upload: display_name={}, mime_type={}, size={}",
            display_name,
            mime_type,
            content.len()
        );

        let start = self
            .execute(
                self.authorized(self.http_client.post(&start_url))
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", content.len())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type)
                    .json(&metadata),
            )
            .await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::invalid_response("Gemini upload start returned no upload URL")
            })?;

        let uploaded: UploadResponse = self
            .execute_json(
                self.http_client
                    .post(&upload_url)
                    .header("X-Goog-Upload-Offset", 0)
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body(content),
            )
            .await?;

        let file = uploaded.file.into_provider_file();
        debug!("Gemini upload finished: name={}, uri={}", file.name, file.uri);
        Ok(file)
    }

    async fn get_file(&self, name: &str) -> Result<ProviderFile, ProviderError> {
        let url = self.api_url(&Self::file_path(name));
        debug!("Fetching Gemini file: {}", url);

        let file: GeminiFile = self
            .execute_json(self.authorized(self.http_client.get(&url)))
            .await?;
        Ok(file.into_provider_file())
    }

    async fn list_files(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<FilePage, ProviderError> {
        let mut url = self.api_url(&format!("files?pageSize={}", page_size));
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        debug!("Listing Gemini files: {}", url);

        let page: ListFilesResponse = self
            .execute_json(self.authorized(self.http_client.get(&url)))
            .await?;

        Ok(FilePage {
            files: page
                .files
                .into_iter()
                .map(GeminiFile::into_provider_file)
                .collect(),
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        let url = self.api_url(&Self::file_path(name));
        debug!("Deleting Gemini file: {}", url);

        self.execute(self.authorized(self.http_client.delete(&url)))
            .await?;
        Ok(())
    }

    async fn generate_content(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let url = self.api_url(&format!("models/{}:generateContent", self.model));
        let body = GenerateContentBody::from(request);

        debug!(
            "Sending generateContent: model={}, turns={}",
            self.model,
            body.contents.len()
        );

        let response: GenerateContentResponse = self
            .execute_json(self.authorized(self.http_client.post(&url)).json(&body))
            .await?;

        response.into_text()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct UploadMetadata<'a> {
    file: UploadFileMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileMetadata<'a> {
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    #[serde(default)]
    files: Vec<GeminiFile>,
    #[serde(default, alias = "next_page_token")]
    next_page_token: Option<String>,
}

/// File resource as returned by the Files API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default, alias = "display_name")]
    display_name: Option<String>,
    #[serde(default, alias = "mime_type")]
    mime_type: Option<String>,
    /// int64 is encoded as a JSON string, but accept numbers too
    #[serde(default, alias = "size_bytes")]
    size_bytes: Option<serde_json::Value>,
    #[serde(default, alias = "create_time")]
    create_time: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl GeminiFile {
    fn into_provider_file(self) -> ProviderFile {
        let size_bytes = match self.size_bytes {
            Some(serde_json::Value::String(s)) => s.parse::<u64>().ok(),
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            _ => None,
        };
        let create_time = self
            .create_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let state = match self.state.as_deref() {
            Some("ACTIVE") => FileState::Active,
            Some("FAILED") => FileState::Failed,
            // PROCESSING and STATE_UNSPECIFIED
            _ => FileState::Pending,
        };

        ProviderFile {
            name: self.name,
            display_name: self.display_name,
            uri: self.uri.unwrap_or_default(),
            mime_type: self.mime_type.unwrap_or_default(),
            size_bytes,
            create_time,
            state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: WireFileData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFileData {
    mime_type: String,
    file_uri: String,
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text },
            Part::File { mime_type, uri } => WirePart::File {
                file_data: WireFileData {
                    mime_type,
                    file_uri: uri,
                },
            },
        }
    }
}

impl From<Content> for WireContent {
    fn from(content: Content) -> Self {
        let role = match content.role {
            Role::User => "user",
            Role::Model => "model",
        };
        WireContent {
            role: Some(role),
            parts: content.parts.into_iter().map(WirePart::from).collect(),
        }
    }
}

impl From<GenerateRequest> for GenerateContentBody {
    fn from(request: GenerateRequest) -> Self {
        GenerateContentBody {
            system_instruction: request.system_instruction.map(|text| WireContent {
                role: None,
                parts: vec![WirePart::Text { text }],
            }),
            contents: request.contents.into_iter().map(WireContent::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, excluding thought parts.
    fn into_text(self) -> Result<String, ProviderError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = block_reason.unwrap_or_else(|| "no candidates".to_string());
            return Err(ProviderError::new(
                ProviderErrorKind::Blocked,
                format!("Gemini returned no answer ({})", reason),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "empty response".to_string());
            return Err(ProviderError::new(
                ProviderErrorKind::Blocked,
                format!("Gemini returned no text ({})", reason),
            ));
        }

        Ok(text)
    }
}
