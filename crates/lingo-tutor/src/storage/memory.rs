use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RepositoryError, MAX_STORED_XP};
use crate::accounts::{AccountRepository, NewAccount, UserAccount, UserId};
use crate::admin::{AdminRepository, BasicStats, TopUser};
use crate::chat::{ChatMessage, ChatRepository, ChatSession, MessageRole, SessionId};
use crate::progression::{
    BadgeAward, BadgeDefinition, BadgeId, ExperienceUpdate, LevelThresholds,
    ProgressionRepository, ProgressionState,
};

/// Process-local store. Every operation runs under a single lock, so each call is
/// one atomic unit of work.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_user_id: i64,
    users: BTreeMap<UserId, UserAccount>,
    awards: Vec<BadgeAward>,
    badge_catalog: BTreeSet<BadgeId>,
    next_session_id: i64,
    sessions: BTreeMap<SessionId, ChatSession>,
    next_message_id: i64,
    messages: Vec<ChatMessage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert_account(
        &self,
        account: NewAccount,
        initial_level: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserAccount, RepositoryError> {
        let mut state = self.lock()?;
        let duplicate = state
            .users
            .values()
            .any(|user| user.username == account.username || user.email == account.email);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        state.next_user_id += 1;
        let created = UserAccount {
            id: UserId(state.next_user_id),
            username: account.username,
            email: account.email,
            language_level: account.language_level,
            preferred_language: account.preferred_language,
            is_admin: account.is_admin,
            created_at,
            progression: ProgressionState::new(initial_level),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn account(&self, user: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock()?.users.get(&user).cloned())
    }
}

#[async_trait]
impl ProgressionRepository for MemoryStore {
    async fn progression(&self, user: UserId) -> Result<Option<ProgressionState>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .get(&user)
            .map(|account| account.progression.clone()))
    }

    async fn record_message_experience(
        &self,
        user: UserId,
        xp: u64,
        thresholds: &LevelThresholds,
    ) -> Result<ExperienceUpdate, RepositoryError> {
        let mut state = self.lock()?;
        let account = state.users.get_mut(&user).ok_or(RepositoryError::NotFound)?;
        let progression = &mut account.progression;

        let cumulative_xp = progression.cumulative_xp.saturating_add(xp).min(MAX_STORED_XP);
        let level = thresholds
            .resolve(cumulative_xp)
            .map_err(|err| RepositoryError::Aborted(err.to_string()))?;

        let previous_level = std::mem::replace(&mut progression.level_label, level.label.clone());
        progression.cumulative_xp = cumulative_xp;
        progression.messages_sent = progression.messages_sent.saturating_add(1);

        Ok(ExperienceUpdate {
            previous_level,
            state: progression.clone(),
        })
    }

    async fn award_badge(
        &self,
        user: UserId,
        badge: &BadgeId,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let account = state.users.get_mut(&user).ok_or(RepositoryError::NotFound)?;
        if !account.progression.badges_held.insert(badge.clone()) {
            return Ok(false);
        }
        state.awards.push(BadgeAward {
            user_id: user,
            badge_id: badge.clone(),
            awarded_at,
        });
        Ok(true)
    }

    async fn badge_awards(&self, user: UserId) -> Result<Vec<BadgeAward>, RepositoryError> {
        Ok(self
            .lock()?
            .awards
            .iter()
            .filter(|award| award.user_id == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn create_session(
        &self,
        user: UserId,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        state.next_session_id += 1;
        let session = ChatSession {
            id: SessionId(state.next_session_id),
            user_id: user,
            title,
            created_at,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn session(&self, session: SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.lock()?.sessions.get(&session).cloned())
    }

    async fn sessions_for_user(&self, user: UserId) -> Result<Vec<ChatSession>, RepositoryError> {
        let state = self.lock()?;
        let mut sessions: Vec<ChatSession> = state
            .sessions
            .values()
            .filter(|session| session.user_id == user)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn set_session_title(
        &self,
        session: SessionId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let found = state
            .sessions
            .get_mut(&session)
            .ok_or(RepositoryError::NotFound)?;
        found.title = Some(title.to_string());
        Ok(())
    }

    async fn delete_session(&self, session: SessionId) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        if state.sessions.remove(&session).is_none() {
            return Ok(false);
        }
        state
            .messages
            .retain(|message| message.chat_session_id != session);
        Ok(true)
    }

    async fn append_message(
        &self,
        session: SessionId,
        user: UserId,
        role: MessageRole,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut state = self.lock()?;
        if !state.sessions.contains_key(&session) {
            return Err(RepositoryError::NotFound);
        }
        state.next_message_id += 1;
        let stored = ChatMessage {
            id: state.next_message_id,
            chat_session_id: session,
            user_id: user,
            role,
            message: message.to_string(),
            timestamp: sent_at,
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn messages(&self, session: SessionId) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self
            .lock()?
            .messages
            .iter()
            .filter(|message| message.chat_session_id == session)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn basic_stats(&self) -> Result<BasicStats, RepositoryError> {
        let state = self.lock()?;
        Ok(BasicStats {
            total_users: state.users.len() as u64,
            total_chat_sessions: state.sessions.len() as u64,
            total_messages: state.messages.len() as u64,
        })
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<TopUser>, RepositoryError> {
        let state = self.lock()?;
        let mut counts: BTreeMap<UserId, u64> = BTreeMap::new();
        for message in state
            .messages
            .iter()
            .filter(|message| message.role == MessageRole::User)
        {
            *counts.entry(message.user_id).or_default() += 1;
        }

        let mut ranked: Vec<TopUser> = counts
            .into_iter()
            .filter_map(|(user_id, message_count)| {
                state.users.get(&user_id).map(|account| TopUser {
                    user_id,
                    username: account.username.clone(),
                    message_count,
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.message_count
                .cmp(&a.message_count)
                .then(a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn is_admin(&self, user: UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .get(&user)
            .map(|account| account.is_admin)
            .unwrap_or(false))
    }

    async fn seed_badges(&self, badges: &[BadgeDefinition]) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        Ok(badges
            .iter()
            .filter(|badge| state.badge_catalog.insert(badge.id.clone()))
            .count())
    }
}
