use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{clean_title, TutorClient, TutorError, TutorPrompt};
use crate::config::TutorConfig;

/// Tutor backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiTutor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionContent,
}

#[derive(Debug, Deserialize)]
struct CompletionContent {
    content: Option<String>,
}

impl OpenAiTutor {
    /// Build a client when the configuration carries an API key.
    pub fn from_config(config: &TutorConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(&self, messages: Vec<CompletionMessage<'_>>) -> Result<String, TutorError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| TutorError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "tutor completion rejected");
            return Err(TutorError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|err| TutorError::Transport(err.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(TutorError::EmptyCompletion)
    }
}

fn system_prompt(prompt: &TutorPrompt) -> String {
    format!(
        "You are a friendly {language} tutor chatting with a {level} learner. \
         Answer in {language}, keep replies short, and gently correct mistakes.",
        language = prompt.language,
        level = prompt.language_level,
    )
}

#[async_trait]
impl TutorClient for OpenAiTutor {
    async fn reply(&self, prompt: &TutorPrompt) -> Result<String, TutorError> {
        let system = system_prompt(prompt);
        let mut messages = vec![CompletionMessage {
            role: "system",
            content: &system,
        }];
        messages.extend(prompt.history.iter().map(|(role, content)| CompletionMessage {
            role: role.as_str(),
            content,
        }));
        messages.push(CompletionMessage {
            role: "user",
            content: &prompt.message,
        });
        self.complete(messages).await
    }

    async fn title_for(&self, message: &str, language: &str) -> Result<String, TutorError> {
        let instruction = format!(
            "You are an assistant that generates short, natural conversation titles.\n\
             Language: {language}\n\
             Tone: Friendly and natural\n\
             Message: \"{message}\"\n\
             Respond ONLY with the title, no quotes or extra text."
        );
        let raw = self
            .complete(vec![CompletionMessage {
                role: "user",
                content: &instruction,
            }])
            .await?;
        Ok(clean_title(&raw))
    }
}
