//! Gamification progression: XP per message, level thresholds and badge awards.
//!
//! The [`engine`] is pure and holds the configured rules; the [`service`] applies it
//! against a [`ProgressionRepository`] that performs each XP increment atomically.

pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AwardedBadgeView, BadgeAward, ExperienceUpdate, MessageLength, ProgressUpdate,
    ProgressionProfile, ProgressionState,
};
pub use engine::{
    calculate_xp, evaluate_badges, resolve_level, BadgeDefinition, BadgeId, BadgeRule,
    EligibilityCriterion, LevelDefinition, LevelThresholds, NextLevel, ProgressSnapshot,
    ProgressionConfig, ProgressionEngine, ThresholdError, XpPolicy,
};
pub use repository::ProgressionRepository;
pub use router::progression_router;
pub use service::{ProgressionError, ProgressionService};
