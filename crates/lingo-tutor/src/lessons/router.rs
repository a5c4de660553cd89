use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::catalog::{LessonCatalog, LessonError, LessonId, QuizAnswer};

pub fn lesson_router(catalog: Arc<LessonCatalog>) -> Router {
    Router::new()
        .route("/api/v1/lessons", get(list_handler))
        .route("/api/v1/lessons/tips", get(tips_handler))
        .route("/api/v1/lessons/:lesson_id", get(lesson_handler))
        .route("/api/v1/lessons/quiz/check", post(check_handler))
        .with_state(catalog)
}

async fn list_handler(State(catalog): State<Arc<LessonCatalog>>) -> Response {
    (StatusCode::OK, Json(catalog.lessons())).into_response()
}

async fn tips_handler(State(catalog): State<Arc<LessonCatalog>>) -> Response {
    (StatusCode::OK, Json(json!({ "tips": catalog.tips() }))).into_response()
}

async fn lesson_handler(
    State(catalog): State<Arc<LessonCatalog>>,
    Path(lesson_id): Path<LessonId>,
) -> Response {
    match catalog.lesson(lesson_id) {
        Ok(lesson) => (StatusCode::OK, Json(lesson)).into_response(),
        Err(err) => lesson_error_response(err),
    }
}

async fn check_handler(
    State(catalog): State<Arc<LessonCatalog>>,
    Json(answer): Json<QuizAnswer>,
) -> Response {
    match catalog.check_answer(&answer) {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(err) => lesson_error_response(err),
    }
}

fn lesson_error_response(err: LessonError) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
}
