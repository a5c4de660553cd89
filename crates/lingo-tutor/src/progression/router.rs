use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::MessageLength;
use super::repository::ProgressionRepository;
use super::service::{ProgressionError, ProgressionService};
use crate::accounts::UserId;

#[derive(Debug, Deserialize)]
pub struct RecordMessageRequest {
    pub message_length: i64,
}

/// Router exposing learner progression and badge checks.
pub fn progression_router<R>(service: Arc<ProgressionService<R>>) -> Router
where
    R: ProgressionRepository + 'static,
{
    Router::new()
        .route("/api/v1/users/:user_id/progress", get(profile_handler::<R>))
        .route(
            "/api/v1/users/:user_id/progress/messages",
            post(record_message_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/badges/check",
            post(check_badges_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn profile_handler<R>(
    State(service): State<Arc<ProgressionService<R>>>,
    Path(user_id): Path<i64>,
) -> Response
where
    R: ProgressionRepository + 'static,
{
    match service.profile(UserId(user_id)).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => progression_error_response(err),
    }
}

pub(crate) async fn record_message_handler<R>(
    State(service): State<Arc<ProgressionService<R>>>,
    Path(user_id): Path<i64>,
    Json(request): Json<RecordMessageRequest>,
) -> Response
where
    R: ProgressionRepository + 'static,
{
    let length = match MessageLength::new(request.message_length) {
        Ok(length) => length,
        Err(err) => return progression_error_response(err),
    };

    match service.record_message(UserId(user_id), length).await {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(err) => progression_error_response(err),
    }
}

pub(crate) async fn check_badges_handler<R>(
    State(service): State<Arc<ProgressionService<R>>>,
    Path(user_id): Path<i64>,
) -> Response
where
    R: ProgressionRepository + 'static,
{
    match service.award_badges(UserId(user_id)).await {
        Ok(new_badges) => {
            (StatusCode::OK, Json(json!({ "new_badges": new_badges }))).into_response()
        }
        Err(err) => progression_error_response(err),
    }
}

pub(crate) fn progression_error_response(err: ProgressionError) -> Response {
    let status = match &err {
        ProgressionError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProgressionError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ProgressionError::Persistence(_) | ProgressionError::UnknownThreshold(_) => {
            error!(error = %err, "progression request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
