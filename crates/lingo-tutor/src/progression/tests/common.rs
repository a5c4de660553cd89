use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::accounts::{AccountRepository, NewAccount, UserId};
use crate::progression::{
    BadgeAward, BadgeId, ExperienceUpdate, LevelThresholds, ProgressionEngine,
    ProgressionRepository, ProgressionService, ProgressionState,
};
use crate::storage::{MemoryStore, RepositoryError};

pub(super) fn engine() -> Arc<ProgressionEngine> {
    Arc::new(ProgressionEngine::standard().expect("standard progression rules are valid"))
}

pub(super) fn new_account(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        language_level: "A2".to_string(),
        preferred_language: "English".to_string(),
        is_admin: false,
    }
}

pub(super) async fn store_with_learner() -> (Arc<MemoryStore>, UserId) {
    let store = Arc::new(MemoryStore::new());
    let account = store
        .insert_account(new_account("ana"), "Beginner", Utc::now())
        .await
        .expect("account stored");
    (store, account.id)
}

pub(super) async fn build_service() -> (ProgressionService<MemoryStore>, Arc<MemoryStore>, UserId) {
    let (store, user) = store_with_learner().await;
    (ProgressionService::new(store.clone(), engine()), store, user)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository whose backend is always down.
pub(super) struct UnavailableRepository;

#[async_trait]
impl ProgressionRepository for UnavailableRepository {
    async fn progression(&self, _user: UserId) -> Result<Option<ProgressionState>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn record_message_experience(
        &self,
        _user: UserId,
        _xp: u64,
        _thresholds: &LevelThresholds,
    ) -> Result<ExperienceUpdate, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn award_badge(
        &self,
        _user: UserId,
        _badge: &BadgeId,
        _awarded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn badge_awards(&self, _user: UserId) -> Result<Vec<BadgeAward>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
