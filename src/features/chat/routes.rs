use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::chat::handlers::chat;
use crate::features::chat::services::ChatService;

/// Create routes for the chat feature
pub fn routes(chat_service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .with_state(chat_service)
}
