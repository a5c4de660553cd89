use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    ChatReply, ChatSession, MessageRole, NewSession, SendMessage, SessionId, SessionTranscript,
};
use super::repository::ChatRepository;
use super::tutor::{TutorClient, TutorError, TutorPrompt, DEFAULT_SESSION_TITLE};
use crate::accounts::{AccountRepository, UserAccount, UserId};
use crate::i18n::DEFAULT_LANGUAGE;
use crate::progression::{MessageLength, ProgressionError, ProgressionRepository, ProgressionService};
use crate::storage::RepositoryError;

/// Turns of earlier conversation handed to the tutor with each message.
pub const HISTORY_WINDOW: usize = 10;
const FALLBACK_TITLE_CHARS: usize = 30;

/// Runs tutor conversations and feeds every learner message into progression.
pub struct ChatService<S> {
    store: Arc<S>,
    tutor: Arc<dyn TutorClient>,
    progression: Arc<ProgressionService<S>>,
}

impl<S> ChatService<S>
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    pub fn new(
        store: Arc<S>,
        tutor: Arc<dyn TutorClient>,
        progression: Arc<ProgressionService<S>>,
    ) -> Self {
        Self {
            store,
            tutor,
            progression,
        }
    }

    pub async fn create_session(&self, request: NewSession) -> Result<ChatSession, ChatServiceError> {
        self.account(request.user_id).await?;
        let title = request
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());
        let session = self
            .store
            .create_session(request.user_id, title, Utc::now())
            .await?;
        info!(user_id = %session.user_id, session_id = %session.id, "chat session created");
        Ok(session)
    }

    pub async fn list_sessions(&self, user: UserId) -> Result<Vec<ChatSession>, ChatServiceError> {
        self.account(user).await?;
        Ok(self.store.sessions_for_user(user).await?)
    }

    pub async fn delete_session(
        &self,
        user: UserId,
        session: SessionId,
    ) -> Result<(), ChatServiceError> {
        self.owned_session(user, session).await?;
        if !self.store.delete_session(session).await? {
            return Err(ChatServiceError::SessionNotFound { user, session });
        }
        info!(user_id = %user, session_id = %session, "chat session deleted");
        Ok(())
    }

    /// Transcripts for one session, or for every session the learner owns.
    pub async fn history(
        &self,
        user: UserId,
        session: Option<SessionId>,
    ) -> Result<Vec<SessionTranscript>, ChatServiceError> {
        let sessions = match session {
            Some(id) => vec![self.owned_session(user, id).await?],
            None => {
                self.account(user).await?;
                self.store.sessions_for_user(user).await?
            }
        };

        let mut transcripts = Vec::with_capacity(sessions.len());
        for session in sessions {
            let messages = self.store.messages(session.id).await?;
            transcripts.push(SessionTranscript {
                chat_session_id: session.id,
                title: session.title,
                created_at: session.created_at,
                messages,
            });
        }
        Ok(transcripts)
    }

    /// Preferred language of a learner, for localizing error bodies.
    pub async fn preferred_language(&self, user: UserId) -> String {
        match self.store.account(user).await {
            Ok(Some(account)) => account.preferred_language,
            _ => DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Store the learner's message, ask the tutor, store the reply and award
    /// the XP, level and badges the message earned.
    pub async fn send_message(&self, request: SendMessage) -> Result<ChatReply, ChatServiceError> {
        if request.message.trim().is_empty() {
            return Err(ChatServiceError::InvalidMessage);
        }
        let text = request.message.as_str();
        let user = request.user_id;
        let account = self.account(user).await?;
        let session = self.owned_session(user, request.chat_session_id).await?;

        let session_title = match session.title.clone() {
            Some(title) => title,
            None => self.generate_title(&session, text, &account).await?,
        };

        let history = self.recent_history(session.id).await?;
        self.store
            .append_message(session.id, user, MessageRole::User, text, Utc::now())
            .await?;

        let prompt = TutorPrompt {
            user_id: user,
            language: account.preferred_language.clone(),
            language_level: account.language_level.clone(),
            history,
            message: text.to_string(),
        };
        let response = self.tutor.reply(&prompt).await.map_err(|err| {
            warn!(user_id = %user, session_id = %session.id, error = %err, "tutor reply failed");
            ChatServiceError::Tutor(err)
        })?;
        self.store
            .append_message(session.id, user, MessageRole::Assistant, &response, Utc::now())
            .await?;

        let update = self
            .progression
            .record_message(user, MessageLength::of_text(text))
            .await?;
        let new_badges = self.progression.award_badges(user).await?;

        Ok(ChatReply {
            response,
            session_title,
            xp_earned: update.xp_earned,
            current_level: update.current_level,
            leveled_up: update.leveled_up,
            new_badges,
        })
    }

    async fn generate_title(
        &self,
        session: &ChatSession,
        message: &str,
        account: &UserAccount,
    ) -> Result<String, ChatServiceError> {
        let title = match self
            .tutor
            .title_for(message, &account.preferred_language)
            .await
        {
            Ok(title) => {
                info!(target: "title_generation", session_id = %session.id, title = %title, "session title generated");
                title
            }
            Err(err) => {
                warn!(target: "title_generation", session_id = %session.id, error = %err, "falling back to message excerpt");
                fallback_title(message)
            }
        };
        self.store.set_session_title(session.id, &title).await?;
        Ok(title)
    }

    async fn recent_history(
        &self,
        session: SessionId,
    ) -> Result<Vec<(MessageRole, String)>, ChatServiceError> {
        let messages = self.store.messages(session).await?;
        let skip = messages.len().saturating_sub(HISTORY_WINDOW);
        Ok(messages
            .into_iter()
            .skip(skip)
            .map(|message| (message.role, message.message))
            .collect())
    }

    async fn account(&self, user: UserId) -> Result<UserAccount, ChatServiceError> {
        self.store
            .account(user)
            .await?
            .ok_or(ChatServiceError::UserNotFound(user))
    }

    async fn owned_session(
        &self,
        user: UserId,
        session: SessionId,
    ) -> Result<ChatSession, ChatServiceError> {
        match self.store.session(session).await? {
            Some(found) if found.user_id == user => Ok(found),
            _ => Err(ChatServiceError::SessionNotFound { user, session }),
        }
    }
}

fn fallback_title(message: &str) -> String {
    let excerpt: String = message.chars().take(FALLBACK_TITLE_CHARS).collect();
    let excerpt = excerpt.trim();
    if excerpt.is_empty() {
        DEFAULT_SESSION_TITLE.to_string()
    } else if message.chars().count() > FALLBACK_TITLE_CHARS {
        format!("{excerpt}...")
    } else {
        excerpt.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatServiceError {
    #[error("message must not be empty")]
    InvalidMessage,
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("chat session {session} not found for user {user}")]
    SessionNotFound { user: UserId, session: SessionId },
    #[error(transparent)]
    Tutor(TutorError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
