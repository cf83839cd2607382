use utoipa::{Modify, OpenApi};

use crate::features::chat::{dtos as chat_dtos, handlers as chat_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::modules::provider::FileState;
use crate::shared::types::MessageResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::delete_file,
        files_handlers::view_file,
        // Chat
        chat_handlers::chat,
    ),
    components(
        schemas(
            // Shared
            MessageResponse,
            // Files
            FileState,
            files_dtos::UploadFileDto,
            files_dtos::FileUploadResponseDto,
            files_dtos::FileRecordDto,
            // Chat
            chat_dtos::ChatRole,
            chat_dtos::ChatTurn,
            chat_dtos::ChatRequestDto,
            chat_dtos::ChatResponseDto,
        )
    ),
    tags(
        (name = "files", description = "Document upload, listing and local copies"),
        (name = "chat", description = "Questions grounded in uploaded documents"),
    ),
    info(
        title = "Document Q&A Gateway API",
        version = "0.1.0",
        description = "Upload documents and ask grounded questions about them",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
