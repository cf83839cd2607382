use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provider-side processing state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileState {
    /// Still being processed by the provider
    Pending,
    /// Ready to be used for grounding
    Active,
    /// Processing failed; the file can never be used
    Failed,
}

/// File record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFile {
    /// Resource name, `files/<id>`
    pub name: String,
    pub display_name: Option<String>,
    pub uri: String,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
    pub create_time: Option<DateTime<Utc>>,
    pub state: FileState,
}

/// One page of a file listing
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<ProviderFile>,
    pub next_page_token: Option<String>,
}

/// An ACTIVE file that can be attached to a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

impl TryFrom<ProviderFile> for FileHandle {
    type Error = ProviderFile;

    /// Only ACTIVE files convert; anything else is handed back unchanged.
    fn try_from(file: ProviderFile) -> Result<Self, Self::Error> {
        if file.state != FileState::Active {
            return Err(file);
        }
        Ok(FileHandle {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        })
    }
}

/// Speaker of a turn, in the provider's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    File { mime_type: String, uri: String },
}

impl From<FileHandle> for Part {
    fn from(handle: FileHandle) -> Self {
        Part::File {
            mime_type: handle.mime_type,
            uri: handle.uri,
        }
    }
}

/// A single turn sent to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A conversation seeded with prior turns, ready to send the next user turn
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    system_instruction: Option<String>,
    history: Vec<Content>,
}

impl Conversation {
    pub fn new(history: Vec<Content>) -> Self {
        Self {
            system_instruction: None,
            history,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Close the conversation over the outgoing user turn.
    pub fn send(self, parts: Vec<Part>) -> GenerateRequest {
        let mut contents = self.history;
        contents.push(Content {
            role: Role::User,
            parts,
        });
        GenerateRequest {
            system_instruction: self.system_instruction,
            contents,
        }
    }
}

/// Full generation request: system instruction plus every turn, newest last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
}
