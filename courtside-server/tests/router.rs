//! Router tests against a scripted model.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use courtside::chat::SharedChatProvider;
use courtside::llms::{MockProvider, MockReply};
use courtside::{ErrorPolicy, LlmError, Team, TeamsService};
use courtside_server::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn router_with(provider: MockProvider) -> Router {
    let service = TeamsService::new(Arc::new(provider)).unwrap();
    build_router(AppState::new(service), Duration::from_secs(5))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn teams_returns_json_array() {
    let router = router_with(MockProvider::always(
        r#"{"items":[{"teamName":"Lakers","city":"Los Angeles"},{"teamName":"Celtics","city":"Boston"}]}"#,
    ));

    let (status, body) = get(router, "/teams").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"teamName": "Lakers", "city": "Los Angeles"},
            {"teamName": "Celtics", "city": "Boston"}
        ])
    );
}

#[tokio::test]
async fn eastern_conference_uses_its_prompt() {
    let provider = Arc::new(MockProvider::always(r#"[{"teamName":"Celtics","city":"Boston"}]"#));
    let service = TeamsService::new(Arc::clone(&provider) as SharedChatProvider).unwrap();
    let router = build_router(AppState::new(service), Duration::from_secs(5));

    let (status, body) = get(router, "/easternConference").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"teamName": "Celtics", "city": "Boston"}]));
    assert_eq!(
        provider.requests()[0].last_user_text(),
        Some("Please name all of the teams in the Eastern Conference of the NBA.")
    );
}

#[tokio::test]
async fn upstream_failures_map_to_statuses() {
    let cases = [
        (LlmError::auth("mock", "bad key"), StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_AUTH"),
        (LlmError::rate_limited("mock"), StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_RATE_LIMITED"),
        (LlmError::network("connection refused"), StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        (LlmError::http_status(404, "no such model"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    ];

    for (error, expected_status, expected_code) in cases {
        let (status, body) = get(router_with(MockProvider::failing(error)), "/teams").await;
        assert_eq!(status, expected_status);
        assert_eq!(body["error"]["code"], expected_code);
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn malformed_reply_is_bad_gateway() {
    let router = router_with(MockProvider::new(vec![MockReply::json(&json!("Lakers, Celtics"))]));

    let (status, body) = get(router, "/teams").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "SCHEMA_PARSE");
}

#[tokio::test]
async fn fallback_policy_serves_configured_list() {
    let service = TeamsService::new(Arc::new(MockProvider::failing(LlmError::rate_limited("mock"))))
        .unwrap()
        .with_policy(ErrorPolicy::Fallback(vec![Team::new("Bulls", "Chicago")]))
        .unwrap();
    let router = build_router(AppState::new(service), Duration::from_secs(5));

    let (status, body) = get(router, "/teams").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"teamName": "Bulls", "city": "Chicago"}]));
}

#[tokio::test]
async fn health_does_not_call_upstream() {
    let provider = Arc::new(MockProvider::failing(LlmError::auth("mock", "no key")));
    let service = TeamsService::new(Arc::clone(&provider) as SharedChatProvider).unwrap();
    let router = build_router(AppState::new(service), Duration::from_secs(5));

    let (status, body) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = router_with(MockProvider::always("[]"))
        .oneshot(Request::builder().uri("/westernConference").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
