// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the relay pipeline, the adapters, and the gateway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::KogotoError;

/// Logical sender id written into message history for relay-originated messages.
pub const SYSTEM_SENDER_ID: &str = "system";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Observability,
}

// --- Sentiment ---

/// Coarse sentiment label assigned by the classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// The structured part of a classification that is stored with a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub score: f64,
}

impl SentimentAnalysis {
    /// True when the sentiment is negative and the score is strictly above `threshold`.
    pub fn is_strongly_negative(&self, threshold: f64) -> bool {
        self.sentiment == Sentiment::Negative && self.score > threshold
    }
}

/// Full classifier output for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub score: f64,
    pub summary: String,
}

impl SentimentResult {
    pub fn analysis(&self) -> SentimentAnalysis {
        SentimentAnalysis {
            sentiment: self.sentiment,
            score: self.score,
        }
    }
}

// --- Complaints ---

/// A complaint that has been classified but not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComplaint {
    pub sender_id: String,
    pub event_id: Option<String>,
    pub original_text: String,
    pub sentiment_analysis: Option<SentimentAnalysis>,
    pub summary: Option<String>,
}

/// A persisted complaint.
///
/// `processed` flips from false to true exactly once, after the delivery
/// scheduler has pushed the record to the linked recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: i64,
    pub sender_id: String,
    pub event_id: Option<String>,
    pub posted_at: String,
    pub original_text: String,
    pub sentiment_analysis: Option<SentimentAnalysis>,
    pub summary: Option<String>,
    pub processed: bool,
}

// --- Settings ---

/// A wall-clock delivery time in 24-hour `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SendingTime {
    hour: u8,
    minute: u8,
}

impl SendingTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, KogotoError> {
        if hour > 23 || minute > 59 {
            return Err(KogotoError::Validation(format!(
                "time out of range: {hour}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Minutes elapsed since local midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl FromStr for SendingTime {
    type Err = KogotoError;

    /// Accepts `H:MM` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KogotoError::Validation(format!("expected H:MM or HH:MM, got '{s}'"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for SendingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Per-recipient delivery preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub sending_frequency: u32,
    pub sending_time: String,
    pub updated_at: String,
}

/// Input to a settings upsert. Both fields are written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub user_id: String,
    pub sending_frequency: u32,
    pub sending_time: SendingTime,
}

// --- Relationships and history ---

/// A sender to recipient link. The pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRelationship {
    pub id: i64,
    pub sender_id: String,
    pub recipient_id: String,
    pub created_at: String,
}

/// One outbound delivery, as recorded after a successful push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistory {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub sent_at: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageHistory {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
}

// --- Inbound events ---

/// A chat-platform event after it has been decoded by a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(MessageEvent),
    /// Follow, unfollow, postback, and every other non-message event.
    Other,
}

/// An inbound message event. Only [`EventContent::Text`] carries a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub event_id: Option<String>,
    pub sender_id: String,
    /// `None` for events that did not arrive through a webhook.
    pub reply_token: Option<String>,
    pub is_redelivery: bool,
    pub content: EventContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventContent {
    Text(String),
    /// Images, stickers, locations, and the rest.
    Other,
}

impl InboundEvent {
    /// Builds a text event with no reply token, as submitted through the admin API.
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message(MessageEvent {
            event_id: None,
            sender_id: sender_id.into(),
            reply_token: None,
            is_redelivery: false,
            content: EventContent::Text(text.into()),
        })
    }
}
