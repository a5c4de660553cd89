use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{AwardedBadgeView, MessageLength, ProgressUpdate, ProgressionProfile};
use super::engine::{BadgeDefinition, ProgressionEngine, ThresholdError};
use super::repository::ProgressionRepository;
use crate::accounts::UserId;
use crate::storage::RepositoryError;

/// Coordinates the progression engine with the repository that owns learner state.
pub struct ProgressionService<R> {
    repository: Arc<R>,
    engine: Arc<ProgressionEngine>,
}

impl<R> ProgressionService<R>
where
    R: ProgressionRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<ProgressionEngine>) -> Self {
        Self { repository, engine }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Award XP for one inbound message and persist the new total and level.
    ///
    /// Badge evaluation is a separate step; see [`ProgressionService::award_badges`].
    pub async fn record_message(
        &self,
        user: UserId,
        length: MessageLength,
    ) -> Result<ProgressUpdate, ProgressionError> {
        let xp_earned = self.engine.calculate_xp(length.get());
        let update = self
            .repository
            .record_message_experience(user, xp_earned, self.engine.thresholds())
            .await
            .map_err(|err| ProgressionError::from_repository(user, err))?;

        let leveled_up = update.previous_level != update.state.level_label;
        if leveled_up {
            info!(
                user_id = %user,
                from = %update.previous_level,
                to = %update.state.level_label,
                cumulative_xp = update.state.cumulative_xp,
                "learner leveled up"
            );
        } else {
            debug!(
                user_id = %user,
                xp_earned,
                cumulative_xp = update.state.cumulative_xp,
                "message experience recorded"
            );
        }

        Ok(ProgressUpdate {
            user_id: user,
            xp_earned,
            cumulative_xp: update.state.cumulative_xp,
            previous_level: update.previous_level,
            current_level: update.state.level_label,
            leveled_up,
        })
    }

    /// Evaluate the badge registry against stored state and persist any new awards.
    /// Re-running it never duplicates an award.
    pub async fn award_badges(
        &self,
        user: UserId,
    ) -> Result<Vec<BadgeDefinition>, ProgressionError> {
        let state = self
            .repository
            .progression(user)
            .await
            .map_err(|err| ProgressionError::from_repository(user, err))?
            .ok_or(ProgressionError::UserNotFound(user))?;

        let qualified = self.engine.evaluate_badges(&state, &state.badges_held)?;
        let awarded_at = Utc::now();
        let mut awarded = Vec::new();
        for badge_id in qualified {
            let created = self
                .repository
                .award_badge(user, &badge_id, awarded_at)
                .await
                .map_err(|err| ProgressionError::from_repository(user, err))?;
            if !created {
                continue;
            }
            if let Some(badge) = self.engine.badge(&badge_id) {
                info!(user_id = %user, badge = %badge.name, "badge awarded");
                awarded.push(badge.clone());
            }
        }

        Ok(awarded)
    }

    pub async fn profile(&self, user: UserId) -> Result<ProgressionProfile, ProgressionError> {
        let state = self
            .repository
            .progression(user)
            .await
            .map_err(|err| ProgressionError::from_repository(user, err))?
            .ok_or(ProgressionError::UserNotFound(user))?;
        let awards = self
            .repository
            .badge_awards(user)
            .await
            .map_err(|err| ProgressionError::from_repository(user, err))?;

        let thresholds = self.engine.thresholds();
        let badges = awards
            .into_iter()
            .filter_map(|award| {
                self.engine
                    .badge(&award.badge_id)
                    .map(|badge| AwardedBadgeView {
                        badge: badge.clone(),
                        awarded_at: award.awarded_at,
                    })
            })
            .collect();

        Ok(ProgressionProfile {
            user_id: user,
            cumulative_xp: state.cumulative_xp,
            level_rank: thresholds.resolve_rank(state.cumulative_xp)?,
            current_level: state.level_label,
            messages_sent: state.messages_sent,
            next: thresholds.next_level(state.cumulative_xp),
            badges,
        })
    }
}

/// Error raised by the progression service.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("progression was not saved: {0}")]
    Persistence(#[source] RepositoryError),
    #[error(transparent)]
    UnknownThreshold(#[from] ThresholdError),
}

impl ProgressionError {
    fn from_repository(user: UserId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::UserNotFound(user),
            other => Self::Persistence(other),
        }
    }
}
