// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dify chat-messages API request/response types.

use serde::{Deserialize, Serialize};

/// Body of `POST /chat-messages`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageRequest {
    /// App variables. The relay never sets any, but Dify requires the object.
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: String,
    /// Always `blocking`; the relay does not consume streams.
    pub response_mode: String,
    /// End-user identifier Dify uses to partition conversations.
    pub user: String,
}

impl ChatMessageRequest {
    pub fn blocking(query: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            inputs: serde_json::Map::new(),
            query: query.into(),
            response_mode: "blocking".to_string(),
            user: user.into(),
        }
    }
}

/// Blocking-mode response. Only `answer` is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageResponse {
    pub answer: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Error body returned by Dify on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

/// Structured classifier answer, when the Dify app is prompted to emit JSON.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClassificationAnswer {
    pub sentiment: String,
    pub score: f64,
    #[serde(default)]
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_empty_inputs() {
        let req = ChatMessageRequest::blocking("hello", "kogoto-classifier");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inputs": {},
                "query": "hello",
                "response_mode": "blocking",
                "user": "kogoto-classifier"
            })
        );
    }

    #[test]
    fn response_tolerates_extra_fields() {
        let body = r#"{"event":"message","answer":"hi","conversation_id":"c1","created_at":1}"#;
        let resp: ChatMessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.answer, "hi");
        assert_eq!(resp.conversation_id.as_deref(), Some("c1"));
        assert!(resp.message_id.is_none());
    }
}
