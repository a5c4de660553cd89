use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;
use crate::progression::BadgeDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_session_id: SessionId,
    pub user_id: UserId,
    pub role: MessageRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Request to open a session. Without a title, one is generated from the first message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub user_id: UserId,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub user_id: UserId,
    pub chat_session_id: SessionId,
    pub message: String,
}

/// Tutor answer plus the progression the message earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_title: String,
    pub xp_earned: u64,
    pub current_level: String,
    pub leveled_up: bool,
    pub new_badges: Vec<BadgeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionTranscript {
    pub chat_session_id: SessionId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}
