use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{FileRecordDto, FileUploadResponseDto, UploadFileDto};
use crate::features::files::services::FileService;
use crate::modules::provider::ProviderErrorKind;
use crate::shared::constants::{DEFAULT_MIME_TYPE, FILE_NOT_CACHED_MESSAGE, UNNAMED_FILE};
use crate::shared::types::MessageResponse;

fn multipart_error(context: &str, e: axum::extract::multipart::MultipartError) -> AppError {
    debug!("{}: {}", context, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, e.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, e.body_text()))
    }
}

/// File reference captured by the `/files/{*file_id}` wildcard
fn path_reference(raw: &str) -> &str {
    raw.trim_start_matches('/')
}

/// Content type sent by the client, else guessed from the filename
fn resolve_mime_type(declared: Option<&str>, filename: &str) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(filename).first_raw().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// Upload a document
///
/// Accepts multipart/form-data with a single `file` field. The file is stored
/// with the provider and a local copy is kept for `/files/view/{filename}`.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form",
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = FileUploadResponseDto),
        (status = 400, description = "Missing or unreadable file"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Provider rejected the upload")
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponseDto>> {
    let mut upload: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNNAMED_FILE.to_string());
        let content_type = resolve_mime_type(field.content_type(), &file_name);

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file data", e))?;

        upload = Some((file_name, content_type, data));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let outcome = service.upload_file(&file_name, &content_type, data).await?;

    Ok(Json(FileUploadResponseDto::from(outcome)))
}

/// List all files known to the provider
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "All provider files", body = Vec<FileRecordDto>),
        (status = 500, description = "Provider error")
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
) -> Result<Json<Vec<FileRecordDto>>> {
    let files = service.list_files().await?;
    Ok(Json(files.into_iter().map(FileRecordDto::from).collect()))
}

/// Get a single file record
///
/// `file_id` may be a bare id, `files/<id>` or a file URI, sent as-is or
/// percent-encoded.
#[utoipa::path(
    get,
    path = "/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File reference")
    ),
    responses(
        (status = 200, description = "File record", body = FileRecordDto),
        (status = 404, description = "File not found"),
        (status = 500, description = "Provider error")
    )
)]
pub async fn get_file(
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<String>,
) -> Result<Json<FileRecordDto>> {
    match service.get_file(path_reference(&file_id)).await {
        Ok(file) => Ok(Json(FileRecordDto::from(file))),
        Err(e) if e.kind == ProviderErrorKind::NotFound => Err(AppError::NotFound(e.message)),
        Err(e) => Err(e.into()),
    }
}

/// Delete a file from the provider
#[utoipa::path(
    delete,
    path = "/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "File reference")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 500, description = "Provider rejected the deletion")
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let file_id = path_reference(&file_id);
    service.delete_file(file_id).await?;

    Ok(Json(MessageResponse::new(format!(
        "File {} deleted successfully",
        file_id
    ))))
}

/// Serve the locally cached copy of an uploaded file
#[utoipa::path(
    get,
    path = "/files/view/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Original filename used at upload")
    ),
    responses(
        (status = 200, description = "Raw file bytes", content_type = "application/octet-stream"),
        (status = 404, description = "No local copy")
    )
)]
pub async fn view_file(
    State(service): State<Arc<FileService>>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let bytes = service
        .read_cached(&filename)
        .await
        .ok_or_else(|| AppError::NotFound(FILE_NOT_CACHED_MESSAGE.to_string()))?;

    let content_type = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mime_type() {
        assert_eq!(
            resolve_mime_type(Some("application/pdf"), "x.bin"),
            "application/pdf"
        );
        assert_eq!(resolve_mime_type(None, "notes.txt"), "text/plain");
        assert_eq!(resolve_mime_type(Some(" "), "report.pdf"), "application/pdf");
        assert_eq!(resolve_mime_type(None, "blob"), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_path_reference_drops_leading_slashes() {
        assert_eq!(path_reference("/files/abc"), "files/abc");
        assert_eq!(path_reference("abc"), "abc");
        assert_eq!(
            path_reference("https://host/v1beta/files/abc"),
            "https://host/v1beta/files/abc"
        );
    }
}
