use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::modules::provider::{
    file_resource_name, FilePage, FileState, GenerateRequest, GenerativeProvider, Part,
    ProviderError, ProviderFile,
};

pub const FAKE_URI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

pub fn provider_file(id: &str, display_name: &str, state: FileState) -> ProviderFile {
    ProviderFile {
        name: format!("files/{}", id),
        display_name: Some(display_name.to_string()),
        uri: format!("{}files/{}", FAKE_URI_BASE, id),
        mime_type: "application/pdf".to_string(),
        size_bytes: Some(42),
        create_time: Some(Utc::now()),
        state,
    }
}

/// In-memory provider with Gemini-like naming
pub struct FakeProvider {
    files: Mutex<BTreeMap<String, ProviderFile>>,
    next_id: AtomicUsize,
    upload_state: FileState,
    requests: Mutex<Vec<GenerateRequest>>,
    generate_error: Mutex<Option<ProviderError>>,
    upload_error: Mutex<Option<ProviderError>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    /// Uploads become ACTIVE immediately.
    pub fn new() -> Self {
        Self::with_upload_state(FileState::Active)
    }

    pub fn with_upload_state(upload_state: FileState) -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            next_id: AtomicUsize::new(1),
            upload_state,
            requests: Mutex::new(Vec::new()),
            generate_error: Mutex::new(None),
            upload_error: Mutex::new(None),
        }
    }

    pub fn insert(&self, file: ProviderFile) {
        self.files.lock().unwrap().insert(file.name.clone(), file);
    }

    pub fn fail_generation(&self, error: ProviderError) {
        *self.generate_error.lock().unwrap() = Some(error);
    }

    pub fn fail_uploads(&self, error: ProviderError) {
        *self.upload_error.lock().unwrap() = Some(error);
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeProvider for FakeProvider {
    async fn upload_file(
        &self,
        display_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<ProviderFile, ProviderError> {
        if let Some(err) = self.upload_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = format!("fake{:04}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut file = provider_file(&id, display_name, self.upload_state);
        file.mime_type = mime_type.to_string();
        file.size_bytes = Some(content.len() as u64);
        self.insert(file.clone());
        Ok(file)
    }

    async fn get_file(&self, name: &str) -> Result<ProviderFile, ProviderError> {
        let name = file_resource_name(name);
        self.files
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("File {} does not exist.", name)))
    }

    async fn list_files(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<FilePage, ProviderError> {
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let files = self.files.lock().unwrap();
        let page: Vec<ProviderFile> = files
            .values()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        let end = start + page.len();
        Ok(FilePage {
            files: page,
            next_page_token: (end < files.len()).then(|| end.to_string()),
        })
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        let name = file_resource_name(name);
        self.files
            .lock()
            .unwrap()
            .remove(&name)
            .map(|_| ())
            .ok_or_else(|| ProviderError::not_found(format!("File {} does not exist.", name)))
    }

    async fn generate_content(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(err) = self.generate_error.lock().unwrap().clone() {
            return Err(err);
        }

        let question = request
            .contents
            .last()
            .and_then(|c| c.parts.first())
            .map(|p| match p {
                Part::Text(text) => text.clone(),
                Part::File { uri, .. } => uri.clone(),
            })
            .unwrap_or_default();
        let attached = request
            .contents
            .last()
            .map(|c| c.parts.iter().filter(|p| matches!(p, Part::File { .. })).count())
            .unwrap_or(0);

        Ok(format!(
            "Answer to \"{}\" grounded in {} file(s)",
            question, attached
        ))
    }
}
