use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::accounts::{AccountRepository, NewAccount, UserId};
use crate::chat::{ChatService, TutorClient, TutorError, TutorPrompt};
use crate::progression::{ProgressionEngine, ProgressionService};
use crate::storage::MemoryStore;

pub(super) struct Fixture {
    pub(super) service: Arc<ChatService<MemoryStore>>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) tutor: Arc<ScriptedTutor>,
}

pub(super) fn account(username: &str, language: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        language_level: "B1".to_string(),
        preferred_language: language.to_string(),
        is_admin: false,
    }
}

pub(super) async fn learner(store: &MemoryStore, username: &str, language: &str) -> UserId {
    store
        .insert_account(account(username, language), "Beginner", Utc::now())
        .await
        .expect("account stored")
        .id
}

pub(super) fn fixture_with(tutor: ScriptedTutor) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(ProgressionEngine::standard().expect("valid rules"));
    let progression = Arc::new(ProgressionService::new(store.clone(), engine));
    let tutor = Arc::new(tutor);
    let service = Arc::new(ChatService::new(
        store.clone(),
        tutor.clone() as Arc<dyn TutorClient>,
        progression,
    ));
    Fixture {
        service,
        store,
        tutor,
    }
}

pub(super) fn fixture() -> Fixture {
    fixture_with(ScriptedTutor::default())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Tutor that records every prompt and can be told to fail.
#[derive(Default)]
pub(super) struct ScriptedTutor {
    pub(super) fail_replies: bool,
    pub(super) fail_titles: bool,
    prompts: Mutex<Vec<TutorPrompt>>,
}

impl ScriptedTutor {
    pub(super) fn failing_replies() -> Self {
        Self {
            fail_replies: true,
            ..Self::default()
        }
    }

    pub(super) fn failing_titles() -> Self {
        Self {
            fail_titles: true,
            ..Self::default()
        }
    }

    pub(super) fn prompts(&self) -> Vec<TutorPrompt> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

#[async_trait]
impl TutorClient for ScriptedTutor {
    async fn reply(&self, prompt: &TutorPrompt) -> Result<String, TutorError> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.clone());
        if self.fail_replies {
            return Err(TutorError::Upstream {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        Ok(format!("echo: {}", prompt.message))
    }

    async fn title_for(&self, _message: &str, language: &str) -> Result<String, TutorError> {
        if self.fail_titles {
            return Err(TutorError::Transport("connection reset".to_string()));
        }
        Ok(format!("Practice in {language}"))
    }
}
