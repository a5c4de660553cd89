use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One rung of the level ladder: the label a learner holds once their cumulative
/// XP reaches `minimum_xp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub label: String,
    pub minimum_xp: u64,
}

impl LevelDefinition {
    pub fn new(label: impl Into<String>, minimum_xp: u64) -> Self {
        Self {
            label: label.into(),
            minimum_xp,
        }
    }
}

/// Where a learner stands relative to the next rung.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextLevel {
    pub next_level: Option<String>,
    pub xp_needed: u64,
}

/// Malformed progression tables. Raised while loading configuration, except
/// `BelowFloor` which guards resolution against an unvalidated table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("level threshold table is empty")]
    Empty,
    #[error("lowest level '{label}' requires {minimum_xp} XP but the table needs a zero-XP floor")]
    MissingFloor { label: String, minimum_xp: u64 },
    #[error("level '{label}' requires {minimum_xp} XP, less than the {previous_minimum} XP of the level ranked below it")]
    NonMonotonic {
        label: String,
        minimum_xp: u64,
        previous_minimum: u64,
    },
    #[error("level '{0}' is listed more than once")]
    DuplicateLabel(String),
    #[error("{xp} XP is below every level threshold")]
    BelowFloor { xp: u64 },
    #[error("xp_per_char must be a finite, non-negative number (got {0})")]
    InvalidXpRate(f64),
    #[error("badge '{0}' is registered more than once")]
    DuplicateBadge(String),
}

/// Resolve the level held at `cumulative_xp`.
///
/// `levels` must be in ascending `minimum_xp` order. The last entry whose minimum is
/// met wins, so equal minimums resolve to the later entry. Returns the rank (index)
/// alongside the definition.
pub fn resolve_level(
    cumulative_xp: u64,
    levels: &[LevelDefinition],
) -> Result<(usize, &LevelDefinition), ThresholdError> {
    let mut current = None;
    for (rank, level) in levels.iter().enumerate() {
        if cumulative_xp >= level.minimum_xp {
            current = Some((rank, level));
        }
    }
    current.ok_or(ThresholdError::BelowFloor { xp: cumulative_xp })
}

/// Validated, rank-ordered level ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelThresholds {
    levels: Vec<LevelDefinition>,
}

impl LevelThresholds {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, ThresholdError> {
        validate_levels(&levels)?;
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    /// Zero-XP level every new learner starts on.
    pub fn floor(&self) -> &LevelDefinition {
        &self.levels[0]
    }

    pub fn resolve(&self, cumulative_xp: u64) -> Result<&LevelDefinition, ThresholdError> {
        resolve_level(cumulative_xp, &self.levels).map(|(_, level)| level)
    }

    pub fn resolve_rank(&self, cumulative_xp: u64) -> Result<usize, ThresholdError> {
        resolve_level(cumulative_xp, &self.levels).map(|(rank, _)| rank)
    }

    pub fn rank_of(&self, label: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.label == label)
    }

    pub fn next_level(&self, cumulative_xp: u64) -> NextLevel {
        match self
            .levels
            .iter()
            .find(|level| level.minimum_xp > cumulative_xp)
        {
            Some(level) => NextLevel {
                next_level: Some(level.label.clone()),
                xp_needed: level.minimum_xp - cumulative_xp,
            },
            None => NextLevel {
                next_level: None,
                xp_needed: 0,
            },
        }
    }
}

pub(crate) fn validate_levels(levels: &[LevelDefinition]) -> Result<(), ThresholdError> {
    let first = levels.first().ok_or(ThresholdError::Empty)?;
    if first.minimum_xp != 0 {
        return Err(ThresholdError::MissingFloor {
            label: first.label.clone(),
            minimum_xp: first.minimum_xp,
        });
    }

    let mut seen = BTreeSet::new();
    let mut previous_minimum = 0;
    for level in levels {
        if !seen.insert(level.label.as_str()) {
            return Err(ThresholdError::DuplicateLabel(level.label.clone()));
        }
        if level.minimum_xp < previous_minimum {
            return Err(ThresholdError::NonMonotonic {
                label: level.label.clone(),
                minimum_xp: level.minimum_xp,
                previous_minimum,
            });
        }
        previous_minimum = level.minimum_xp;
    }

    Ok(())
}
