// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use kogoto_core::{KogotoError, PluginAdapter, StorageAdapter};
use kogoto_relay::{DeliveryScheduler, IntakeHandler, RecipientHandler};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthConfig, auth_middleware};
use crate::{handlers, webhooks};

/// State for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: std::time::Instant,
    /// Adapters whose health checks feed `GET /health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Renders Prometheus text when the exporter is enabled.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub intake: Arc<IntakeHandler>,
    pub recipient: Arc<RecipientHandler>,
    pub scheduler: Arc<DeliveryScheduler>,
    pub storage: Arc<dyn StorageAdapter>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the full route table.
///
/// - `GET /`, `GET /health`, `GET /metrics` (public)
/// - `POST /line/webhook/{sender,recipient}` (public, called by LINE)
/// - `/api/*` (bearer auth)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/line/webhook/sender", post(webhooks::post_sender_webhook))
        .route(
            "/line/webhook/recipient",
            post(webhooks::post_recipient_webhook),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/complaints", post(handlers::post_complaint))
        .route("/api/send-messages", post(handlers::post_send_messages))
        .route("/api/settings", post(handlers::post_settings))
        .route("/api/settings/{user_id}", get(handlers::get_settings))
        .route("/api/relationships", post(handlers::post_relationship))
        .route(
            "/api/relationships/recipient/{sender_id}",
            get(handlers::get_recipient_for_sender),
        )
        .route(
            "/api/relationships/sender/{recipient_id}",
            get(handlers::get_sender_for_recipient),
        )
        .route("/api/history/{receiver_id}", get(handlers::get_history))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `cancel` fires, then drains in-flight
/// requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), KogotoError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KogotoError::Transport {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| KogotoError::Transport {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}
