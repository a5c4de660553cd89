use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{NewAccount, UserId};
use super::repository::AccountRepository;
use super::service::{AccountService, AccountServiceError};
use crate::i18n::{self, ErrorKey};
use crate::storage::RepositoryError;

pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: AccountRepository + 'static,
{
    Router::new()
        .route("/api/v1/users", post(register_handler::<R>))
        .route("/api/v1/users/:user_id", get(account_handler::<R>))
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Json(account): Json<NewAccount>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.register(account).await {
        Ok(created) => (StatusCode::CREATED, Json(created.view())).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn account_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Path(user_id): Path<i64>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.get(UserId(user_id)).await {
        Ok(account) => (StatusCode::OK, Json(account.view())).into_response(),
        Err(err) => account_error_response(err),
    }
}

fn account_error_response(err: AccountServiceError) -> Response {
    let (status, message) = match &err {
        AccountServiceError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        AccountServiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            i18n::message(ErrorKey::UserNotFound, i18n::DEFAULT_LANGUAGE).to_string(),
        ),
        AccountServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            "username or email already registered".to_string(),
        ),
        AccountServiceError::Repository(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}
