// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LINE webhook endpoints.
//!
//! Every event in a delivery is handled concurrently; the response is 200
//! only when every handler succeeded, so LINE redelivers on failure.

use axum::{Json, extract::State, http::StatusCode};
use futures::future::join_all;
use kogoto_line::WebhookBody;
use tracing::{debug, warn};

use crate::server::GatewayState;

pub async fn post_sender_webhook(
    State(state): State<GatewayState>,
    Json(body): Json<WebhookBody>,
) -> StatusCode {
    let events = body.into_inbound();
    debug!(count = events.len(), "sender webhook received");

    let results = join_all(events.into_iter().map(|e| state.intake.handle(e))).await;
    let failed = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .inspect(|e| warn!(error = %e, "sender event failed"))
        .count();
    status_for(failed)
}

pub async fn post_recipient_webhook(
    State(state): State<GatewayState>,
    Json(body): Json<WebhookBody>,
) -> StatusCode {
    let events = body.into_inbound();
    debug!(count = events.len(), "recipient webhook received");

    let results = join_all(events.into_iter().map(|e| state.recipient.handle(e))).await;
    let failed = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .inspect(|e| warn!(error = %e, "recipient event failed"))
        .count();
    status_for(failed)
}

fn status_for(failed: usize) -> StatusCode {
    if failed == 0 {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
