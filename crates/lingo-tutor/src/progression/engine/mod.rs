mod badges;
mod config;
mod levels;
mod xp;

pub use badges::{
    evaluate_badges, BadgeDefinition, BadgeId, BadgeRule, EligibilityCriterion, ProgressSnapshot,
};
pub use config::ProgressionConfig;
pub use levels::{resolve_level, LevelDefinition, LevelThresholds, NextLevel, ThresholdError};
pub use xp::{calculate_xp, XpPolicy, DEFAULT_BASE_XP, DEFAULT_XP_PER_CHAR};

use std::collections::BTreeSet;

use super::domain::ProgressionState;

/// Stateless evaluator combining the XP rule, level ladder and badge registry.
#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    xp: XpPolicy,
    thresholds: LevelThresholds,
    badges: Vec<BadgeRule>,
}

impl ProgressionEngine {
    pub fn new(config: ProgressionConfig) -> Result<Self, ThresholdError> {
        config.validate()?;
        let ProgressionConfig { xp, levels, badges } = config;
        Ok(Self {
            xp,
            thresholds: LevelThresholds::new(levels)?,
            badges,
        })
    }

    pub fn standard() -> Result<Self, ThresholdError> {
        Self::new(ProgressionConfig::standard())
    }

    pub fn xp_policy(&self) -> &XpPolicy {
        &self.xp
    }

    pub fn thresholds(&self) -> &LevelThresholds {
        &self.thresholds
    }

    pub fn badge_rules(&self) -> &[BadgeRule] {
        &self.badges
    }

    pub fn badge(&self, id: &BadgeId) -> Option<&BadgeDefinition> {
        self.badges
            .iter()
            .map(|rule| &rule.badge)
            .find(|badge| &badge.id == id)
    }

    pub fn calculate_xp(&self, message_length: u64) -> u64 {
        self.xp.calculate(message_length)
    }

    /// Fresh state for a learner who has not sent anything yet.
    pub fn initial_state(&self) -> ProgressionState {
        ProgressionState::new(self.thresholds.floor().label.clone())
    }

    /// Apply one inbound message to `state`: award XP, add it to the running total,
    /// recompute the level and count the message. Returns the XP earned.
    ///
    /// `state` is untouched when an error is returned.
    pub fn apply_message_progression(
        &self,
        state: &mut ProgressionState,
        message_length: u64,
    ) -> Result<u64, ThresholdError> {
        let xp_earned = self.calculate_xp(message_length);
        self.apply_experience(state, xp_earned)?;
        state.messages_sent = state.messages_sent.saturating_add(1);
        Ok(xp_earned)
    }

    /// Add `xp` to the running total and recompute the level label.
    pub fn apply_experience(
        &self,
        state: &mut ProgressionState,
        xp: u64,
    ) -> Result<(), ThresholdError> {
        let total = state.cumulative_xp.saturating_add(xp);
        let level = self.thresholds.resolve(total)?;
        state.cumulative_xp = total;
        state.level_label = level.label.clone();
        Ok(())
    }

    pub fn snapshot(&self, state: &ProgressionState) -> Result<ProgressSnapshot, ThresholdError> {
        Ok(ProgressSnapshot {
            cumulative_xp: state.cumulative_xp,
            messages_sent: state.messages_sent,
            level_rank: self.thresholds.resolve_rank(state.cumulative_xp)?,
        })
    }

    /// Badges newly earned by `state`, given the set already held.
    pub fn evaluate_badges(
        &self,
        state: &ProgressionState,
        held: &BTreeSet<BadgeId>,
    ) -> Result<Vec<BadgeId>, ThresholdError> {
        let snapshot = self.snapshot(state)?;
        Ok(evaluate_badges(&self.badges, &snapshot, held))
    }
}
