use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::repository::AdminRepository;
use super::service::{AdminError, AdminService};
use crate::accounts::UserId;
use crate::i18n::{self, ErrorKey};

/// Header naming the calling account.
pub const CALLER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub struct TopUsersQuery {
    pub limit: Option<usize>,
}

pub fn admin_router<R>(service: Arc<AdminService<R>>) -> Router
where
    R: AdminRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admin/analytics/basic-stats",
            get(basic_stats_handler::<R>),
        )
        .route("/api/v1/admin/analytics/top-users", get(top_users_handler::<R>))
        .route("/api/v1/admin/badges/seed", post(seed_badges_handler::<R>))
        .route("/api/v1/admin/logs", get(logs_handler::<R>))
        .with_state(service)
}

fn caller(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(CALLER_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(UserId)
}

pub(crate) async fn basic_stats_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: AdminRepository + 'static,
{
    if let Err(err) = service.authorize(caller(&headers)).await {
        return admin_error_response(err);
    }
    match service.basic_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn top_users_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
    Query(query): Query<TopUsersQuery>,
) -> Response
where
    R: AdminRepository + 'static,
{
    if let Err(err) = service.authorize(caller(&headers)).await {
        return admin_error_response(err);
    }
    match service.top_users(query.limit).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn seed_badges_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: AdminRepository + 'static,
{
    if let Err(err) = service.authorize(caller(&headers)).await {
        return admin_error_response(err);
    }
    match service.seed_badges().await {
        Ok(created) => (StatusCode::OK, Json(json!({ "created": created }))).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn logs_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: AdminRepository + 'static,
{
    if let Err(err) = service.authorize(caller(&headers)).await {
        return admin_error_response(err);
    }
    match service.recent_logs().await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

fn admin_error_response(err: AdminError) -> Response {
    let (status, message) = match &err {
        AdminError::Forbidden => (
            StatusCode::FORBIDDEN,
            i18n::message(ErrorKey::UnauthorizedAccess, i18n::DEFAULT_LANGUAGE).to_string(),
        ),
        AdminError::LogsUnavailable => (StatusCode::NOT_FOUND, err.to_string()),
        AdminError::LogRead(_) | AdminError::Repository(_) => {
            error!(error = %err, "admin request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}
