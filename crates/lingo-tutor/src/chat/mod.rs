//! Tutor chat: sessions, transcripts and the message flow that drives progression.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod tutor;

#[cfg(test)]
mod tests;

pub use domain::{
    ChatMessage, ChatReply, ChatSession, MessageRole, NewSession, SendMessage, SessionId,
    SessionTranscript,
};
pub use repository::ChatRepository;
pub use router::chat_router;
pub use service::{ChatService, ChatServiceError, HISTORY_WINDOW};
pub use tutor::{CannedTutor, OpenAiTutor, TutorClient, TutorError, TutorPrompt};
