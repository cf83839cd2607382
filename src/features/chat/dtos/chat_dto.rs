use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Speaker of a prior turn. Anything other than `user` is treated as the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(other)]
    Assistant,
}

/// One prior turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Request DTO for asking a question
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChatRequestDto {
    /// The user's question
    #[validate(length(min = 1, message = "Message must not be empty"))]
    #[schema(example = "Summarize page 1")]
    pub message: String,

    /// Prior turns, oldest first. The server keeps no history between requests.
    #[serde(default)]
    pub history: Vec<ChatTurn>,

    /// File references to ground the answer in: `uri`, `name` or a bare id.
    /// References that are unknown or not yet ACTIVE are skipped.
    #[serde(default)]
    pub file_ids: Option<Vec<String>>,
}

/// Response DTO for chat
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponseDto {
    /// The assistant's reply
    pub response: String,
}
