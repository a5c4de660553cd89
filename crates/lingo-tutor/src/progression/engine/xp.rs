use serde::{Deserialize, Serialize};

/// Flat award for any message, before the per-character bonus.
pub const DEFAULT_BASE_XP: u64 = 10;
/// Bonus XP per character of message text.
pub const DEFAULT_XP_PER_CHAR: f64 = 0.5;

/// XP award rule: `base_xp + floor(message_length * xp_per_char)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpPolicy {
    pub base_xp: u64,
    pub xp_per_char: f64,
}

impl Default for XpPolicy {
    fn default() -> Self {
        Self {
            base_xp: DEFAULT_BASE_XP,
            xp_per_char: DEFAULT_XP_PER_CHAR,
        }
    }
}

impl XpPolicy {
    pub fn calculate(&self, message_length: u64) -> u64 {
        // f64 -> u64 casts saturate, and NaN is rejected when the policy is loaded.
        let bonus = (message_length as f64 * self.xp_per_char).floor() as u64;
        self.base_xp.saturating_add(bonus)
    }

    pub fn is_valid(&self) -> bool {
        self.xp_per_char.is_finite() && self.xp_per_char >= 0.0
    }
}

/// XP earned by a message of `message_length` characters under the default policy.
pub fn calculate_xp(message_length: u64) -> u64 {
    XpPolicy::default().calculate(message_length)
}
