// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LINE webhook payloads.
//!
//! Events are decoded into tagged unions on `type` (and `message.type`), so
//! only text messages carry a payload and every other event kind collapses
//! into an `Unsupported` variant that the relay ignores. Each event is
//! decoded on its own; one malformed event does not reject its siblings.

use kogoto_core::{EventContent, InboundEvent, MessageEvent};
use serde::Deserialize;
use tracing::warn;

/// Body of a webhook POST.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    /// Bot user id the events are addressed to.
    #[serde(default)]
    pub destination: Option<String>,
    /// Raw events, decoded one by one in [`WebhookBody::into_inbound`].
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message(MessagePayload),
    /// follow, unfollow, join, postback, beacon, ...
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    pub message: EventMessage,
    #[serde(default)]
    pub webhook_event_id: Option<String>,
    #[serde(default)]
    pub delivery_context: Option<DeliveryContext>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventMessage {
    Text(TextContent),
    /// image, video, audio, file, location, sticker
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    /// `user`, `group`, or `room`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryContext {
    pub is_redelivery: bool,
}

impl WebhookEvent {
    /// Convert into the relay's platform-neutral event.
    ///
    /// A message without a user id keeps an empty sender, which the
    /// handlers treat as ignorable.
    pub fn into_inbound(self) -> InboundEvent {
        match self {
            WebhookEvent::Message(payload) => InboundEvent::Message(MessageEvent {
                event_id: payload.webhook_event_id,
                sender_id: payload
                    .source
                    .and_then(|s| s.user_id)
                    .unwrap_or_default(),
                reply_token: payload.reply_token,
                is_redelivery: payload.delivery_context.is_some_and(|d| d.is_redelivery),
                content: match payload.message {
                    EventMessage::Text(t) => EventContent::Text(t.text),
                    EventMessage::Unsupported => EventContent::Other,
                },
            }),
            WebhookEvent::Unsupported => InboundEvent::Other,
        }
    }
}

impl WebhookBody {
    /// Events that fail to decode become [`InboundEvent::Other`].
    pub fn into_inbound(self) -> Vec<InboundEvent> {
        self.events
            .into_iter()
            .map(|raw| match serde_json::from_value::<WebhookEvent>(raw) {
                Ok(event) => event.into_inbound(),
                Err(e) => {
                    warn!(error = %e, "skipping malformed webhook event");
                    InboundEvent::Other
                }
            })
            .collect()
    }
}
