// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests against the assembled router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use kogoto_config::model::{RelayConfig, SchedulerConfig};
use kogoto_core::{PluginAdapter, Sentiment, StorageAdapter};
use kogoto_gateway::{AuthConfig, GatewayState, HealthState, build_router};
use kogoto_relay::{DeliveryScheduler, IntakeHandler, RecipientHandler};
use kogoto_test_utils::{MemoryStorage, MockClassifier, MockComposer, MockTransport};
use tower::ServiceExt;

const TOKEN: &str = "admin-secret";

struct App {
    router: axum::Router,
    storage: Arc<MemoryStorage>,
    classifier: Arc<MockClassifier>,
    sender: Arc<MockTransport>,
    recipient: Arc<MockTransport>,
}

fn app_with_token(token: Option<&str>) -> App {
    let storage = Arc::new(MemoryStorage::new());
    let classifier = Arc::new(MockClassifier::new());
    let composer = Arc::new(MockComposer::new());
    let sender = Arc::new(MockTransport::new());
    let recipient = Arc::new(MockTransport::new());

    let state = GatewayState {
        intake: Arc::new(IntakeHandler::new(
            classifier.clone(),
            composer.clone(),
            storage.clone(),
            sender.clone(),
            RelayConfig::default(),
        )),
        recipient: Arc::new(
            RecipientHandler::new(storage.clone(), recipient.clone(), &RelayConfig::default())
                .unwrap(),
        ),
        scheduler: Arc::new(DeliveryScheduler::new(
            storage.clone(),
            composer,
            recipient.clone(),
            SchedulerConfig::default(),
        )),
        storage: storage.clone(),
        auth: AuthConfig {
            bearer_token: token.map(String::from),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            adapters: vec![
                storage.clone() as Arc<dyn PluginAdapter>,
                sender.clone() as Arc<dyn PluginAdapter>,
            ],
            prometheus_render: Some(Arc::new(|| "kogoto_deliveries_total 0\n".to_string())),
        },
    };

    App {
        router: build_router(state),
        storage,
        classifier,
        sender,
        recipient,
    }
}

fn app() -> App {
    app_with_token(Some(TOKEN))
}

fn api(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn webhook(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn text_event(user: &str, text: &str, token: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "replyToken": token,
        "source": { "type": "user", "userId": user },
        "message": { "type": "text", "id": "m", "text": text }
    })
}

#[tokio::test]
async fn root_and_health_are_public() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["version"].is_string());

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_reports_degraded_storage() {
    let app = app();
    app.storage.fail_reads(true);

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["adapters"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn metrics_render_prometheus_text() {
    let response = app()
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 16).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("kogoto_deliveries_total"));
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/settings/h1")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["status"], "error");

    let response = app
        .router
        .oneshot(Request::get("/api/settings/h1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_fail_closed_without_configured_token() {
    let app = app_with_token(None);
    let response = app
        .router
        .oneshot(api("POST", "/api/send-messages", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn complaint_submission_records_without_reply() {
    let app = app();
    app.classifier.push_result(Sentiment::Neutral, 0.4, "late").await;

    let response = app
        .router
        .oneshot(api(
            "POST",
            "/api/complaints",
            Some(serde_json::json!({"user_id": "w1", "text": "home late again"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["outcome"], "recorded");
    assert_eq!(app.storage.complaint_count().await, 1);
    assert!(app.sender.replies().await.is_empty());
}

#[tokio::test]
async fn complaint_submission_validates_input() {
    let response = app()
        .router
        .oneshot(api(
            "POST",
            "/api/complaints",
            Some(serde_json::json!({"user_id": "w1", "text": "  "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_round_trip_and_validation() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(api(
            "POST",
            "/api/settings",
            Some(serde_json::json!({"user_id": "h1", "frequency": 2, "time": "7:30"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(api("GET", "/api/settings/h1", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["sending_time"], "07:30");
    assert_eq!(body["data"]["sending_frequency"], 2);

    for bad in [
        serde_json::json!({"user_id": "h1", "frequency": 0, "time": "07:30"}),
        serde_json::json!({"user_id": "h1", "frequency": 2, "time": "25:00"}),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(api("POST", "/api/settings", Some(bad)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .router
        .oneshot(api("GET", "/api/settings/nobody", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relationships_are_idempotent_and_queryable() {
    let app = app();
    let link = serde_json::json!({"sender_id": "w1", "recipient_id": "h1"});

    let first = json_body(
        app.router
            .clone()
            .oneshot(api("POST", "/api/relationships", Some(link.clone())))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.router
            .clone()
            .oneshot(api("POST", "/api/relationships", Some(link)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let body = json_body(
        app.router
            .clone()
            .oneshot(api("GET", "/api/relationships/recipient/w1", None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["recipient_id"], "h1");

    let body = json_body(
        app.router
            .clone()
            .oneshot(api("GET", "/api/relationships/sender/h1", None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["sender_id"], "w1");

    let response = app
        .router
        .oneshot(api("GET", "/api/relationships/recipient/unknown", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_messages_runs_a_batch_and_history_shows_it() {
    let app = app();
    app.router
        .clone()
        .oneshot(api(
            "POST",
            "/api/complaints",
            Some(serde_json::json!({"user_id": "w1", "text": "dishes"})),
        ))
        .await
        .unwrap();
    app.storage.register_relationship("w1", "h1").await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(api("POST", "/api/send-messages", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["fetched"], 1);
    assert_eq!(body["data"]["groups"][0]["outcome"]["status"], "delivered");
    assert_eq!(app.recipient.pushes().await.len(), 1);

    let body = json_body(
        app.router
            .oneshot(api("GET", "/api/history/h1", None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["sender_id"], "system");
}

#[tokio::test]
async fn sender_webhook_handles_every_event() {
    let app = app();
    let response = app
        .router
        .oneshot(webhook(
            "/line/webhook/sender",
            serde_json::json!({
                "destination": "Ubot",
                "events": [
                    text_event("w1", "first", "rt-1"),
                    text_event("w2", "second", "rt-2"),
                    { "type": "follow", "replyToken": "rt-3", "source": { "type": "user", "userId": "w3" } }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.storage.complaint_count().await, 2);
    assert_eq!(app.sender.replies().await.len(), 2);
}

#[tokio::test]
async fn malformed_event_does_not_block_valid_siblings() {
    let app = app();
    let response = app
        .router
        .oneshot(webhook(
            "/line/webhook/sender",
            serde_json::json!({
                "events": [
                    text_event("w1", "first", "rt-1"),
                    { "type": "message", "replyToken": "rt-2", "source": { "type": "user", "userId": "w2" } }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.storage.complaint_count().await, 1);
    assert_eq!(app.sender.replies().await.len(), 1);
    assert_eq!(app.sender.replies().await[0].0, "rt-1");
}

#[tokio::test]
async fn sender_webhook_returns_500_when_a_reply_fails() {
    let app = app();
    app.sender.fail_replies(true);

    let response = app
        .router
        .oneshot(webhook(
            "/line/webhook/sender",
            serde_json::json!({ "events": [text_event("w1", "first", "rt-1")] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn recipient_webhook_applies_commands() {
    let app = app();
    let response = app
        .router
        .oneshot(webhook(
            "/line/webhook/recipient",
            serde_json::json!({ "events": [text_event("h1", "/time 21:05", "rt-h")] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let settings = app.storage.get_user_settings("h1").await.unwrap().unwrap();
    assert_eq!(settings.sending_time, "21:05");
    assert_eq!(
        app.recipient.replies().await,
        vec![("rt-h".to_string(), "Delivery time set to 21:05.".to_string())]
    );
}

#[tokio::test]
async fn webhook_rejects_malformed_json() {
    let response = app()
        .router
        .oneshot(
            Request::post("/line/webhook/sender")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
