use serde::{Deserialize, Serialize};

use crate::accounts::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BasicStats {
    pub total_users: u64,
    pub total_chat_sessions: u64,
    pub total_messages: u64,
}

/// Learner ranked by the number of messages they sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUser {
    pub user_id: UserId,
    pub username: String,
    pub message_count: u64,
}
