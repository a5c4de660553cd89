use lingo_tutor::chat::{CannedTutor, OpenAiTutor, TutorClient};
use lingo_tutor::config::TutorConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// LLM-backed tutor when a key is configured, otherwise the offline one.
pub(crate) fn select_tutor(config: &TutorConfig) -> Arc<dyn TutorClient> {
    match OpenAiTutor::from_config(config) {
        Some(tutor) => {
            info!(model = %config.model, base_url = %config.base_url, "using chat-completions tutor");
            Arc::new(tutor)
        }
        None => {
            warn!("no tutor API key configured; replies come from the offline tutor");
            Arc::new(CannedTutor)
        }
    }
}
