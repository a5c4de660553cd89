use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{NewAccount, UserAccount, UserId};
use super::repository::AccountRepository;
use crate::progression::ProgressionEngine;
use crate::storage::RepositoryError;

pub struct AccountService<R> {
    repository: Arc<R>,
    engine: Arc<ProgressionEngine>,
}

impl<R> AccountService<R>
where
    R: AccountRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<ProgressionEngine>) -> Self {
        Self { repository, engine }
    }

    /// Register a learner on the floor level with zero XP.
    pub async fn register(&self, account: NewAccount) -> Result<UserAccount, AccountServiceError> {
        let account = normalize(account)?;
        let floor = self.engine.thresholds().floor().label.clone();
        let created = self
            .repository
            .insert_account(account, &floor, Utc::now())
            .await?;
        info!(user_id = %created.id, username = %created.username, "account registered");
        Ok(created)
    }

    pub async fn get(&self, user: UserId) -> Result<UserAccount, AccountServiceError> {
        self.repository
            .account(user)
            .await?
            .ok_or(AccountServiceError::NotFound(user))
    }
}

fn normalize(mut account: NewAccount) -> Result<NewAccount, AccountServiceError> {
    account.username = account.username.trim().to_string();
    account.email = account.email.trim().to_ascii_lowercase();
    account.preferred_language = account.preferred_language.trim().to_string();

    if account.username.is_empty() {
        return Err(AccountServiceError::Invalid("username must not be empty"));
    }
    if !account.email.contains('@') {
        return Err(AccountServiceError::Invalid("email must contain '@'"));
    }
    if account.preferred_language.is_empty() {
        account.preferred_language = "English".to_string();
    }
    Ok(account)
}

#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("invalid account: {0}")]
    Invalid(&'static str),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> AccountService<MemoryStore> {
        AccountService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ProgressionEngine::standard().expect("valid rules")),
        )
    }

    fn account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            language_level: "A2".to_string(),
            preferred_language: " ".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn registration_normalizes_and_starts_on_the_floor() {
        let service = service();
        let created = service
            .register(account("  ana ", " Ana@Example.COM "))
            .await
            .expect("registered");

        assert_eq!(created.username, "ana");
        assert_eq!(created.email, "ana@example.com");
        assert_eq!(created.preferred_language, "English");
        assert_eq!(created.progression.level_label, "Beginner");
        assert_eq!(created.view().current_xp, 0);
    }

    #[tokio::test]
    async fn duplicates_and_invalid_payloads_are_rejected() {
        let service = service();
        service
            .register(account("ana", "ana@example.com"))
            .await
            .expect("registered");

        let duplicate = service
            .register(account("ana", "other@example.com"))
            .await
            .expect_err("duplicate");
        assert!(matches!(
            duplicate,
            AccountServiceError::Repository(RepositoryError::Conflict)
        ));

        let invalid = service
            .register(account("bob", "not-an-email"))
            .await
            .expect_err("invalid");
        assert!(matches!(invalid, AccountServiceError::Invalid(_)));

        let missing = service.get(UserId(42)).await.expect_err("missing");
        assert!(matches!(missing, AccountServiceError::NotFound(UserId(42))));
    }
}
