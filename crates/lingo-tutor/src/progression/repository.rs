use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{BadgeAward, ExperienceUpdate, ProgressionState};
use super::engine::{BadgeId, LevelThresholds};
use crate::accounts::UserId;
use crate::storage::RepositoryError;

/// Storage boundary for learner progression.
#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    async fn progression(&self, user: UserId) -> Result<Option<ProgressionState>, RepositoryError>;

    /// Atomically add `xp` to the learner's total, count one message and store the
    /// level `thresholds` resolves for the new total, all in one unit of work.
    /// Concurrent calls for the same learner must never lose an increment.
    async fn record_message_experience(
        &self,
        user: UserId,
        xp: u64,
        thresholds: &LevelThresholds,
    ) -> Result<ExperienceUpdate, RepositoryError>;

    /// Insert an award unless the learner already holds the badge. Returns whether a
    /// new award was created.
    async fn award_badge(
        &self,
        user: UserId,
        badge: &BadgeId,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn badge_awards(&self, user: UserId) -> Result<Vec<BadgeAward>, RepositoryError>;
}
