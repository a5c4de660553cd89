use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::ProgressionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_language() -> String {
    "English".to_string()
}

/// Registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub language_level: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub language_level: String,
    pub preferred_language: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub progression: ProgressionState,
}

impl UserAccount {
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            language_level: self.language_level.clone(),
            preferred_language: self.preferred_language.clone(),
            is_admin: self.is_admin,
            current_xp: self.progression.cumulative_xp,
            current_level: self.progression.level_label.clone(),
        }
    }
}

/// Public account payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub language_level: String,
    pub preferred_language: String,
    pub is_admin: bool,
    pub current_xp: u64,
    pub current_level: String,
}
