use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(pub String);

impl BadgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry shown to learners when a badge is awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// Eligibility predicate attached to a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityCriterion {
    ExperienceAtLeast { xp: u64 },
    MessagesAtLeast { messages: u64 },
    LevelRankAtLeast { rank: usize },
}

impl EligibilityCriterion {
    pub fn is_met(&self, progress: &ProgressSnapshot) -> bool {
        match self {
            EligibilityCriterion::ExperienceAtLeast { xp } => progress.cumulative_xp >= *xp,
            EligibilityCriterion::MessagesAtLeast { messages } => {
                progress.messages_sent >= *messages
            }
            EligibilityCriterion::LevelRankAtLeast { rank } => progress.level_rank >= *rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRule {
    pub badge: BadgeDefinition,
    pub criterion: EligibilityCriterion,
}

/// The subset of learner state badge criteria are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub cumulative_xp: u64,
    pub messages_sent: u64,
    pub level_rank: usize,
}

/// Badges whose criterion holds and which are not already held, in registry order.
pub fn evaluate_badges(
    rules: &[BadgeRule],
    progress: &ProgressSnapshot,
    held: &BTreeSet<BadgeId>,
) -> Vec<BadgeId> {
    rules
        .iter()
        .filter(|rule| !held.contains(&rule.badge.id))
        .filter(|rule| rule.criterion.is_met(progress))
        .map(|rule| rule.badge.id.clone())
        .collect()
}

pub(crate) fn standard_badges() -> Vec<BadgeRule> {
    vec![
        BadgeRule {
            badge: BadgeDefinition {
                id: BadgeId::new("first-100-xp"),
                name: "First 100 XP".to_string(),
                description: "You reached 100 XP!".to_string(),
                icon: "🏅".to_string(),
            },
            criterion: EligibilityCriterion::ExperienceAtLeast { xp: 100 },
        },
        BadgeRule {
            badge: BadgeDefinition {
                id: BadgeId::new("chatterbox"),
                name: "Chatterbox".to_string(),
                description: "You've sent 50 messages!".to_string(),
                icon: "💬".to_string(),
            },
            criterion: EligibilityCriterion::MessagesAtLeast { messages: 50 },
        },
        BadgeRule {
            badge: BadgeDefinition {
                id: BadgeId::new("level-up"),
                name: "Level Up!".to_string(),
                description: "You reached your first new level!".to_string(),
                icon: "📈".to_string(),
            },
            criterion: EligibilityCriterion::LevelRankAtLeast { rank: 1 },
        },
    ]
}
