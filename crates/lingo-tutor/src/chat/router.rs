use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{NewSession, SendMessage, SessionId};
use super::repository::ChatRepository;
use super::service::{ChatService, ChatServiceError};
use crate::accounts::{AccountRepository, UserId};
use crate::i18n::{self, ErrorKey};
use crate::progression::router::progression_error_response;
use crate::progression::ProgressionRepository;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub chat_session_id: Option<i64>,
}

pub fn chat_router<S>(service: Arc<ChatService<S>>) -> Router
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    Router::new()
        .route("/api/v1/chat", post(send_message_handler::<S>))
        .route("/api/v1/chat/sessions", post(create_session_handler::<S>))
        .route(
            "/api/v1/chat/sessions/user/:user_id",
            get(list_sessions_handler::<S>),
        )
        .route(
            "/api/v1/chat/sessions/:session_id",
            delete(delete_session_handler::<S>),
        )
        .route("/api/v1/chat/history/:user_id", get(history_handler::<S>))
        .with_state(service)
}

pub(crate) async fn send_message_handler<S>(
    State(service): State<Arc<ChatService<S>>>,
    Json(request): Json<SendMessage>,
) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    match service.send_message(request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => chat_error_response(&service, err).await,
    }
}

pub(crate) async fn create_session_handler<S>(
    State(service): State<Arc<ChatService<S>>>,
    Json(request): Json<NewSession>,
) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    match service.create_session(request).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => chat_error_response(&service, err).await,
    }
}

pub(crate) async fn list_sessions_handler<S>(
    State(service): State<Arc<ChatService<S>>>,
    Path(user_id): Path<i64>,
) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    match service.list_sessions(UserId(user_id)).await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(err) => chat_error_response(&service, err).await,
    }
}

pub(crate) async fn delete_session_handler<S>(
    State(service): State<Arc<ChatService<S>>>,
    Path(session_id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    match service
        .delete_session(UserId(owner.user_id), SessionId(session_id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => chat_error_response(&service, err).await,
    }
}

pub(crate) async fn history_handler<S>(
    State(service): State<Arc<ChatService<S>>>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    let session = query.chat_session_id.map(SessionId);
    match service.history(UserId(user_id), session).await {
        Ok(transcripts) => (StatusCode::OK, Json(transcripts)).into_response(),
        Err(err) => chat_error_response(&service, err).await,
    }
}

async fn chat_error_response<S>(service: &ChatService<S>, err: ChatServiceError) -> Response
where
    S: ChatRepository + AccountRepository + ProgressionRepository + 'static,
{
    let (status, message) = match err {
        ChatServiceError::InvalidMessage => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        ChatServiceError::UserNotFound(_) => (
            StatusCode::NOT_FOUND,
            i18n::message(ErrorKey::UserNotFound, i18n::DEFAULT_LANGUAGE).to_string(),
        ),
        ChatServiceError::SessionNotFound { user, .. } => {
            let language = service.preferred_language(user).await;
            (
                StatusCode::NOT_FOUND,
                i18n::message(ErrorKey::ChatSessionNotFound, &language).to_string(),
            )
        }
        ChatServiceError::Tutor(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        ChatServiceError::Progression(inner) => return progression_error_response(inner),
        ChatServiceError::Repository(_) => {
            error!(error = %err, "chat request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}
