//! LLM tutor collaborator used for replies and session titles.

mod openai;

pub use openai::OpenAiTutor;

use async_trait::async_trait;

use super::domain::MessageRole;
use crate::accounts::UserId;

/// Fallback title for sessions whose title could not be generated.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";
const MAX_TITLE_CHARS: usize = 60;

/// Everything the tutor sees for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorPrompt {
    pub user_id: UserId,
    pub language: String,
    pub language_level: String,
    /// Earlier turns of the session, oldest first.
    pub history: Vec<(MessageRole, String)>,
    pub message: String,
}

#[async_trait]
pub trait TutorClient: Send + Sync {
    async fn reply(&self, prompt: &TutorPrompt) -> Result<String, TutorError>;

    /// Short, natural title for a session opened with `message`.
    async fn title_for(&self, message: &str, language: &str) -> Result<String, TutorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("tutor transport failed: {0}")]
    Transport(String),
    #[error("tutor returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("tutor returned an empty completion")]
    EmptyCompletion,
}

/// Strip quotes and whitespace from a generated title and cap its length.
pub fn clean_title(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .replace('"', "")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_SESSION_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Offline tutor with deterministic answers, used when no LLM key is configured.
#[derive(Debug, Default, Clone)]
pub struct CannedTutor;

#[async_trait]
impl TutorClient for CannedTutor {
    async fn reply(&self, prompt: &TutorPrompt) -> Result<String, TutorError> {
        let words = prompt.message.split_whitespace().count();
        let reply = match words {
            0 => "I'm listening! Try writing a sentence and I'll help you polish it.".to_string(),
            1..=3 => format!(
                "Nice start! Can you turn \"{}\" into a full sentence in {}?",
                prompt.message.trim(),
                prompt.language
            ),
            _ => format!(
                "Great practice! You wrote {words} words. Try saying the same idea another way in {}.",
                prompt.language
            ),
        };
        Ok(reply)
    }

    async fn title_for(&self, message: &str, _language: &str) -> Result<String, TutorError> {
        let title = message
            .split_whitespace()
            .take(5)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(clean_title(&title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_quotes_and_falls_back() {
        assert_eq!(clean_title("  \"Ordering Coffee\"  "), "Ordering Coffee");
        assert_eq!(clean_title("\"\""), DEFAULT_SESSION_TITLE);
        assert_eq!(clean_title(&"x".repeat(200)).chars().count(), MAX_TITLE_CHARS);
    }

    #[tokio::test]
    async fn canned_tutor_titles_from_leading_words() {
        let title = CannedTutor
            .title_for("how do I order a coffee in Paris please", "English")
            .await
            .expect("canned title");
        assert_eq!(title, "how do I order a");
    }
}
