use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::badges::{standard_badges, BadgeRule};
use super::levels::{validate_levels, LevelDefinition, ThresholdError};
use super::xp::XpPolicy;

/// Tunable progression data: XP award rule, level ladder and badge registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub xp: XpPolicy,
    pub levels: Vec<LevelDefinition>,
    #[serde(default)]
    pub badges: Vec<BadgeRule>,
}

impl ProgressionConfig {
    pub fn standard() -> Self {
        Self {
            xp: XpPolicy::default(),
            levels: vec![
                LevelDefinition::new("Beginner", 0),
                LevelDefinition::new("Novice", 100),
                LevelDefinition::new("Apprentice", 200),
                LevelDefinition::new("Adept", 400),
                LevelDefinition::new("Expert", 700),
                LevelDefinition::new("Master", 1000),
                LevelDefinition::new("Grandmaster", 1500),
            ],
            badges: standard_badges(),
        }
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        if !self.xp.is_valid() {
            return Err(ThresholdError::InvalidXpRate(self.xp.xp_per_char));
        }
        validate_levels(&self.levels)?;

        let mut seen = BTreeSet::new();
        for rule in &self.badges {
            if !seen.insert(&rule.badge.id) {
                return Err(ThresholdError::DuplicateBadge(rule.badge.id.0.clone()));
            }
        }
        Ok(())
    }
}
