// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin API and public status handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use kogoto_core::{HealthStatus, InboundEvent, SendingTime, SettingsUpdate};
use kogoto_relay::IntakeOutcome;
use serde::{Deserialize, Serialize};

use crate::response::{self, bad_request, internal, not_found, success};
use crate::server::GatewayState;

/// Newest-first page size for `GET /api/history/{receiver_id}`.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ComplaintRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub user_id: String,
    pub frequency: i64,
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRequest {
    pub sender_id: String,
    pub recipient_id: String,
}

#[derive(Debug, Serialize)]
struct LinkView<'a> {
    sender_id: &'a str,
    recipient_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, otherwise `degraded`.
    pub status: &'static str,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    #[serde(rename = "type")]
    pub adapter_type: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub async fn get_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Kogoto relay is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let mut adapters = Vec::with_capacity(state.health.adapters.len());
    for adapter in &state.health.adapters {
        let (status, detail) = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(d)) => ("degraded", Some(d)),
            Ok(HealthStatus::Unhealthy(d)) => ("unhealthy", Some(d)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            adapter_type: adapter.adapter_type().to_string(),
            status,
            detail,
        });
    }

    let all_healthy = adapters.iter().all(|a| a.status == "healthy");
    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" },
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    })
}

pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `POST /api/complaints`: runs intake for an out-of-band submission.
pub async fn post_complaint(
    State(state): State<GatewayState>,
    Json(body): Json<ComplaintRequest>,
) -> Response {
    if body.user_id.trim().is_empty() || body.text.trim().is_empty() {
        return bad_request("user_id and text are required");
    }

    match state
        .intake
        .handle(InboundEvent::text(body.user_id, body.text))
        .await
    {
        Ok(outcome @ IntakeOutcome::Failed { .. }) => {
            tracing::warn!(?outcome, "admin complaint was not recorded");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "complaint could not be recorded")
        }
        Ok(outcome) => success(outcome),
        Err(e) => internal("complaint intake failed", &e),
    }
}

/// `POST /api/send-messages`: runs one delivery batch now.
pub async fn post_send_messages(State(state): State<GatewayState>) -> Response {
    match state.scheduler.run_batch().await {
        Ok(report) => success(report),
        Err(e) => internal("delivery batch failed", &e),
    }
}

pub async fn post_settings(
    State(state): State<GatewayState>,
    Json(body): Json<SettingsRequest>,
) -> Response {
    if body.user_id.trim().is_empty() {
        return bad_request("user_id is required");
    }
    let Some(frequency) = u32::try_from(body.frequency).ok().filter(|f| *f > 0) else {
        return bad_request("frequency must be a positive integer");
    };
    let sending_time = match body.time.parse::<SendingTime>() {
        Ok(t) => t,
        Err(_) => return bad_request("time must be H:MM or HH:MM"),
    };

    let update = SettingsUpdate {
        user_id: body.user_id,
        sending_frequency: frequency,
        sending_time,
    };
    match state.storage.upsert_user_settings(&update).await {
        Ok(settings) => success(settings),
        Err(e) => internal("failed to save settings", &e),
    }
}

pub async fn get_settings(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.storage.get_user_settings(&user_id).await {
        Ok(Some(settings)) => success(settings),
        Ok(None) => not_found("settings"),
        Err(e) => internal("failed to load settings", &e),
    }
}

pub async fn post_relationship(
    State(state): State<GatewayState>,
    Json(body): Json<RelationshipRequest>,
) -> Response {
    if body.sender_id.trim().is_empty() || body.recipient_id.trim().is_empty() {
        return bad_request("sender_id and recipient_id are required");
    }
    match state
        .storage
        .register_relationship(&body.sender_id, &body.recipient_id)
        .await
    {
        Ok(link) => success(link),
        Err(e) => internal("failed to register relationship", &e),
    }
}

pub async fn get_recipient_for_sender(
    State(state): State<GatewayState>,
    Path(sender_id): Path<String>,
) -> Response {
    match state.storage.find_recipient_for_sender(&sender_id).await {
        Ok(Some(recipient_id)) => success(LinkView {
            sender_id: &sender_id,
            recipient_id: &recipient_id,
        }),
        Ok(None) => not_found("relationship"),
        Err(e) => internal("failed to look up relationship", &e),
    }
}

pub async fn get_sender_for_recipient(
    State(state): State<GatewayState>,
    Path(recipient_id): Path<String>,
) -> Response {
    match state.storage.find_sender_for_recipient(&recipient_id).await {
        Ok(Some(sender_id)) => success(LinkView {
            sender_id: &sender_id,
            recipient_id: &recipient_id,
        }),
        Ok(None) => not_found("relationship"),
        Err(e) => internal("failed to look up relationship", &e),
    }
}

pub async fn get_history(
    State(state): State<GatewayState>,
    Path(receiver_id): Path<String>,
) -> Response {
    match state
        .storage
        .list_message_history(&receiver_id, HISTORY_LIMIT)
        .await
    {
        Ok(entries) => success(entries),
        Err(e) => internal("failed to load message history", &e),
    }
}
