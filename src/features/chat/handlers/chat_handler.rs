use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::chat::dtos::{ChatRequestDto, ChatResponseDto};
use crate::features::chat::services::ChatService;

/// Ask a question about uploaded files
///
/// History is supplied by the caller on every request. File references that
/// are unknown or still processing are skipped rather than failing the call.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequestDto,
    responses(
        (status = 200, description = "Provider reply", body = ChatResponseDto),
        (status = 400, description = "Malformed or invalid request"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn chat(
    State(service): State<Arc<ChatService>>,
    AppJson(dto): AppJson<ChatRequestDto>,
) -> Result<Json<ChatResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;

    let response = service
        .ask_question(&dto.message, &dto.history, dto.file_ids.as_deref())
        .await?;

    Ok(Json(ChatResponseDto { response }))
}
