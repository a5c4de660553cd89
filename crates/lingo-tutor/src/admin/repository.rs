use async_trait::async_trait;

use super::domain::{BasicStats, TopUser};
use crate::accounts::UserId;
use crate::progression::BadgeDefinition;
use crate::storage::RepositoryError;

/// Aggregate queries and catalog maintenance used by operators.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn basic_stats(&self) -> Result<BasicStats, RepositoryError>;

    /// Learners with at least one message, most active first. Ties go to the
    /// older account.
    async fn top_users(&self, limit: usize) -> Result<Vec<TopUser>, RepositoryError>;

    async fn is_admin(&self, user: UserId) -> Result<bool, RepositoryError>;

    /// Insert catalog rows for badges not yet stored. Returns how many were added.
    async fn seed_badges(&self, badges: &[BadgeDefinition]) -> Result<usize, RepositoryError>;
}
