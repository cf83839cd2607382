use std::sync::Arc;
use tracing::{debug, info};

use crate::features::chat::dtos::{ChatRole, ChatTurn};
use crate::features::files::FileService;
use crate::modules::provider::{
    Content, Conversation, GenerativeProvider, Part, ProviderError, Role,
};

/// Grounded question answering over uploaded files
pub struct ChatService {
    provider: Arc<dyn GenerativeProvider>,
    files: Arc<FileService>,
    system_instruction: String,
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        files: Arc<FileService>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            files,
            system_instruction: system_instruction.into(),
        }
    }

    /// Ask a question, seeded with the caller's history and grounded in the
    /// referenced files.
    ///
    /// File references that cannot be resolved are skipped; a failure of the
    /// generation call itself is returned as is.
    pub async fn ask_question(
        &self,
        message: &str,
        history: &[ChatTurn],
        file_refs: Option<&[String]>,
    ) -> Result<String, ProviderError> {
        let conversation = Conversation::new(history.iter().map(to_content).collect())
            .with_system_instruction(self.system_instruction.clone());

        let handles = match file_refs {
            Some(refs) if !refs.is_empty() => self.files.resolve_files(refs).await,
            _ => Vec::new(),
        };
        let attached = handles.len();

        let mut parts = Vec::with_capacity(attached + 1);
        parts.push(Part::Text(message.to_string()));
        parts.extend(handles.into_iter().map(Part::from));

        debug!(
            "Sending chat turn: history_len={}, files_attached={}",
            history.len(),
            attached
        );

        let reply = self
            .provider
            .generate_content(conversation.send(parts))
            .await?;

        info!(
            "Chat answered: files_attached={}, reply_len={}",
            attached,
            reply.len()
        );
        Ok(reply)
    }
}

fn to_content(turn: &ChatTurn) -> Content {
    let role = match turn.role {
        ChatRole::User => Role::User,
        ChatRole::Assistant => Role::Model,
    };
    Content::text(role, turn.content.clone())
}
