use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use lingo_tutor::accounts::{account_router, AccountService};
use lingo_tutor::admin::{admin_router, AdminService};
use lingo_tutor::chat::{chat_router, ChatService, TutorClient};
use lingo_tutor::lessons::{lesson_router, LessonCatalog};
use lingo_tutor::progression::{progression_router, ProgressionEngine, ProgressionService};
use lingo_tutor::storage::Store;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the HTTP surface is built from.
pub(crate) struct AppDependencies<S> {
    pub(crate) store: Arc<S>,
    pub(crate) engine: Arc<ProgressionEngine>,
    pub(crate) tutor: Arc<dyn TutorClient>,
    pub(crate) log_dir: Option<PathBuf>,
}

pub(crate) fn app_router<S>(deps: AppDependencies<S>) -> Router
where
    S: Store,
{
    let AppDependencies {
        store,
        engine,
        tutor,
        log_dir,
    } = deps;

    let progression = Arc::new(ProgressionService::new(store.clone(), engine.clone()));
    let accounts = Arc::new(AccountService::new(store.clone(), engine.clone()));
    let chat = Arc::new(ChatService::new(store.clone(), tutor, progression.clone()));
    let admin = Arc::new(AdminService::new(store, engine, log_dir));

    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(account_router(accounts))
        .merge(progression_router(progression))
        .merge(chat_router(chat))
        .merge(lesson_router(Arc::new(LessonCatalog::standard())))
        .merge(admin_router(admin))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lingo_tutor::chat::CannedTutor;
    use lingo_tutor::storage::MemoryStore;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> Router {
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        app_router(AppDependencies {
            store: Arc::new(MemoryStore::new()),
            engine: Arc::new(ProgressionEngine::standard().expect("valid rules")),
            tutor: Arc::new(CannedTutor),
            log_dir: None,
        })
        .layer(Extension(state))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        let router = app(readiness.clone());

        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_chat_and_read_progress_end_to_end() {
        let router = app(Arc::new(AtomicBool::new(true)));

        let created = router
            .clone()
            .oneshot(
                Request::post("/api/v1/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "username": "ana",
                            "email": "ana@example.com",
                            "language_level": "A2"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(created.status(), StatusCode::CREATED);
        let user = body_json(created).await;
        assert_eq!(user["current_level"], "Beginner");

        let session = router
            .clone()
            .oneshot(
                Request::post("/api/v1/chat/sessions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "user_id": user["id"] }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        let session = body_json(session).await;

        let reply = router
            .clone()
            .oneshot(
                Request::post("/api/v1/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "user_id": user["id"],
                            "chat_session_id": session["id"],
                            "message": "x".repeat(180),
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(reply.status(), StatusCode::OK);
        let reply = body_json(reply).await;
        assert_eq!(reply["xp_earned"], 100);
        assert_eq!(reply["current_level"], "Novice");

        let progress = router
            .oneshot(
                Request::get(format!("/api/v1/users/{}/progress", user["id"]))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        let progress = body_json(progress).await;
        assert_eq!(progress["cumulative_xp"], 100);
        assert_eq!(progress["messages_sent"], 1);
        assert_eq!(progress["badges"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn lessons_are_served() {
        let router = app(Arc::new(AtomicBool::new(true)));

        let response = router
            .oneshot(
                Request::get("/api/v1/lessons/tips")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["tips"].as_array().map(Vec::len),
            Some(10)
        );
    }
}
