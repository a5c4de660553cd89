use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{ChatMessage, ChatSession, MessageRole, SessionId};
use crate::accounts::UserId;
use crate::storage::RepositoryError;

/// Storage for tutor sessions and their transcripts.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_session(
        &self,
        user: UserId,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError>;

    async fn session(&self, session: SessionId) -> Result<Option<ChatSession>, RepositoryError>;

    /// Sessions owned by `user`, newest first.
    async fn sessions_for_user(&self, user: UserId) -> Result<Vec<ChatSession>, RepositoryError>;

    async fn set_session_title(
        &self,
        session: SessionId,
        title: &str,
    ) -> Result<(), RepositoryError>;

    /// Remove a session together with its messages. Returns whether it existed.
    async fn delete_session(&self, session: SessionId) -> Result<bool, RepositoryError>;

    async fn append_message(
        &self,
        session: SessionId,
        user: UserId,
        role: MessageRole,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError>;

    /// Messages of a session in the order they were sent.
    async fn messages(&self, session: SessionId) -> Result<Vec<ChatMessage>, RepositoryError>;
}
