use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::chat::{chat_router, NewSession};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn chat_route_returns_reply_with_progression() {
    let fx = fixture();
    let user = learner(&fx.store, "lea", "English").await;
    let router = chat_router(fx.service.clone());

    let created = router
        .clone()
        .oneshot(post_json("/api/v1/chat/sessions", json!({ "user_id": user.0 })))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let session = read_json_body(created).await;

    let response = router
        .oneshot(post_json(
            "/api/v1/chat",
            json!({
                "user_id": user.0,
                "chat_session_id": session["id"],
                "message": "hello there",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["response"], "echo: hello there");
    assert_eq!(payload["xp_earned"], 15);
    assert_eq!(payload["current_level"], "Beginner");
    assert_eq!(payload["new_badges"], json!([]));
}

#[tokio::test]
async fn missing_session_is_localized_for_the_learner() {
    let fx = fixture();
    let user = learner(&fx.store, "lucia", "Spanish").await;
    let router = chat_router(fx.service.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/chat",
            json!({ "user_id": user.0, "chat_session_id": 42, "message": "hola" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "Sesión de chat no encontrada o no pertenece al usuario"
    );
}

#[tokio::test]
async fn tutor_outage_is_a_bad_gateway() {
    let fx = fixture_with(ScriptedTutor::failing_replies());
    let user = learner(&fx.store, "lea", "English").await;
    let session = fx
        .service
        .create_session(NewSession {
            user_id: user,
            title: Some("Warmup".to_string()),
        })
        .await
        .expect("session");
    let router = chat_router(fx.service.clone());

    let response = router
        .oneshot(post_json(
            "/api/v1/chat",
            json!({ "user_id": user.0, "chat_session_id": session.id.0, "message": "hi" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn delete_route_requires_the_owner() {
    let fx = fixture();
    let owner = learner(&fx.store, "lea", "English").await;
    let other = learner(&fx.store, "max", "English").await;
    let session = fx
        .service
        .create_session(NewSession {
            user_id: owner,
            title: None,
        })
        .await
        .expect("session");
    let router = chat_router(fx.service.clone());

    let denied = router
        .clone()
        .oneshot(
            Request::delete(format!(
                "/api/v1/chat/sessions/{}?user_id={}",
                session.id, other
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::NOT_FOUND);

    let deleted = router
        .oneshot(
            Request::delete(format!(
                "/api/v1/chat/sessions/{}?user_id={}",
                session.id, owner
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn history_route_filters_by_session() {
    let fx = fixture();
    let user = learner(&fx.store, "lea", "English").await;
    let session = fx
        .service
        .create_session(NewSession {
            user_id: user,
            title: Some("Only".to_string()),
        })
        .await
        .expect("session");
    let router = chat_router(fx.service.clone());

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/chat/history/{}?chat_session_id={}",
                user, session.id
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["title"], "Only");
    assert_eq!(payload[0]["messages"], json!([]));
}
