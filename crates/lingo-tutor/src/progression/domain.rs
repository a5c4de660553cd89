use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{BadgeDefinition, BadgeId, NextLevel};
use super::service::ProgressionError;
use crate::accounts::UserId;

/// Per-learner progression: monotonically growing XP and message count, the
/// level derived from XP and an append-only badge set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub cumulative_xp: u64,
    pub level_label: String,
    pub messages_sent: u64,
    pub badges_held: BTreeSet<BadgeId>,
}

impl ProgressionState {
    pub fn new(level_label: impl Into<String>) -> Self {
        Self {
            cumulative_xp: 0,
            level_label: level_label.into(),
            messages_sent: 0,
            badges_held: BTreeSet::new(),
        }
    }
}

/// Character count of an inbound message, validated before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MessageLength(u64);

impl MessageLength {
    pub fn new(length: i64) -> Result<Self, ProgressionError> {
        u64::try_from(length).map(Self).map_err(|_| {
            ProgressionError::InvalidInput(format!(
                "message length must be a non-negative integer, got {length}"
            ))
        })
    }

    /// Length of `text` in Unicode scalar values.
    pub fn of_text(text: &str) -> Self {
        Self(text.chars().count() as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Store-side result of an atomic XP increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceUpdate {
    pub previous_level: String,
    pub state: ProgressionState,
}

/// Outcome of recording one message, reported back to the chat flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub user_id: UserId,
    pub xp_earned: u64,
    pub cumulative_xp: u64,
    pub previous_level: String,
    pub current_level: String,
    pub leveled_up: bool,
}

/// Permanent record that a learner earned a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardedBadgeView {
    #[serde(flatten)]
    pub badge: BadgeDefinition,
    pub awarded_at: DateTime<Utc>,
}

/// Profile payload combining stored state with the level ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionProfile {
    pub user_id: UserId,
    pub cumulative_xp: u64,
    pub current_level: String,
    pub level_rank: usize,
    pub messages_sent: u64,
    #[serde(flatten)]
    pub next: NextLevel,
    pub badges: Vec<AwardedBadgeView>,
}
