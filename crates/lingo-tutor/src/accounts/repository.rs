use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{NewAccount, UserAccount, UserId};
use crate::storage::RepositoryError;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account starting on `initial_level`. Duplicate usernames or
    /// e-mail addresses yield [`RepositoryError::Conflict`].
    async fn insert_account(
        &self,
        account: NewAccount,
        initial_level: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserAccount, RepositoryError>;

    async fn account(&self, user: UserId) -> Result<Option<UserAccount>, RepositoryError>;
}
