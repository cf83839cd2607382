pub mod chat_handler;

pub use chat_handler::{__path_chat, chat};
