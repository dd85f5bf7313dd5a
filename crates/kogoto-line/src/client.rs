// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the LINE Messaging API.
//!
//! Wraps the reply, push, and bot-info endpoints. Pushes carry an
//! `X-Line-Retry-Key` so that a retry after a transient failure cannot
//! deliver the same message twice.

use std::time::Duration;

use kogoto_core::KogotoError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum characters in one LINE text message.
pub const MAX_TEXT_CHARS: usize = 5000;

const RETRY_KEY_HEADER: &str = "X-Line-Retry-Key";

#[derive(Debug, Serialize)]
struct OutboundText {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl OutboundText {
    fn new(text: &str) -> Self {
        Self {
            kind: "text",
            text: truncate_text(text),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<OutboundText>,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<OutboundText>,
}

#[derive(Debug, Deserialize)]
struct LineErrorBody {
    message: String,
}

/// Subset of `GET /v2/bot/info`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInfo {
    pub user_id: String,
    #[serde(default)]
    pub basic_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LineClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl LineClient {
    pub fn new(
        channel_access_token: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, KogotoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {channel_access_token}")).map_err(|e| {
                KogotoError::Config(format!("invalid LINE channel access token: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| KogotoError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Answers an inbound event. Reply tokens are single-use, so this is
    /// never retried.
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<(), KogotoError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![OutboundText::new(text)],
        };
        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        debug!(status = %status, "LINE reply response");
        if status.is_success() {
            return Ok(());
        }
        Err(api_error("reply", status, response).await)
    }

    /// Pushes a message to `to`, retrying once on transient statuses with the
    /// same retry key.
    pub async fn push(&self, to: &str, text: &str) -> Result<(), KogotoError> {
        let body = PushRequest {
            to,
            messages: vec![OutboundText::new(text)],
        };
        let retry_key = uuid::Uuid::new_v4().to_string();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, to, "retrying LINE push after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(format!("{}/v2/bot/message/push", self.base_url))
                .header(RETRY_KEY_HEADER, &retry_key)
                .json(&body)
                .send()
                .await
                .map_err(request_failed)?;

            let status = response.status();
            debug!(status = %status, attempt, to, "LINE push response");

            if status.is_success() {
                return Ok(());
            }
            // 409 on a retry means the first attempt was accepted after all.
            if attempt > 0 && status == reqwest::StatusCode::CONFLICT {
                return Ok(());
            }
            if is_transient_error(status) && attempt < self.max_retries {
                continue;
            }
            return Err(api_error("push", status, response).await);
        }

        Err(KogotoError::transport("LINE push failed after retries"))
    }

    pub async fn bot_info(&self) -> Result<BotInfo, KogotoError> {
        let response = self
            .client
            .get(format!("{}/v2/bot/info", self.base_url))
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error("bot info", status, response).await);
        }
        response.json().await.map_err(|e| KogotoError::Transport {
            message: format!("failed to parse LINE bot info: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn request_failed(e: reqwest::Error) -> KogotoError {
    KogotoError::Transport {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn api_error(
    operation: &str,
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> KogotoError {
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<LineErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    KogotoError::transport(format!("LINE {operation} rejected ({status}): {detail}"))
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Cuts `text` to [`MAX_TEXT_CHARS`] characters on a char boundary.
pub fn truncate_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> LineClient {
        LineClient::new("line-token", &server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let long = "あ".repeat(MAX_TEXT_CHARS + 10);
        let cut = truncate_text(&long);
        assert_eq!(cut.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(truncate_text("short"), "short");
    }

    #[tokio::test]
    async fn reply_posts_token_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .and(header("authorization", "Bearer line-token"))
            .and(body_json(serde_json::json!({
                "replyToken": "rt-1",
                "messages": [{"type": "text", "text": "thanks"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server).reply("rt-1", "thanks").await.unwrap();
    }

    #[tokio::test]
    async fn reply_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/reply"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"message": "oops"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).reply("rt", "x").await.unwrap_err();
        assert!(matches!(err, KogotoError::Transport { .. }));
        assert!(err.to_string().contains("oops"));
    }

    #[tokio::test]
    async fn push_sends_retry_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .and(header_exists("x-line-retry-key"))
            .and(body_json(serde_json::json!({
                "to": "h1",
                "messages": [{"type": "text", "text": "summary"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server).push("h1", "summary").await.unwrap();
    }

    #[tokio::test]
    async fn push_retries_once_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        test_client(&server).push("h1", "x").await.unwrap();
    }

    #[tokio::test]
    async fn push_conflict_on_retry_counts_as_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        test_client(&server).push("h1", "x").await.unwrap();
    }

    #[tokio::test]
    async fn push_client_error_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"message": "The request body has 1 error(s)"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).push("h1", "x").await.unwrap_err().to_string();
        assert!(err.contains("400"), "got: {err}");
    }

    #[tokio::test]
    async fn bot_info_parses_camel_case() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/bot/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userId": "Ubot",
                "basicId": "@kogoto",
                "displayName": "Kogoto",
                "chatMode": "bot",
                "markAsReadMode": "auto"
            })))
            .mount(&server)
            .await;

        let info = test_client(&server).bot_info().await.unwrap();
        assert_eq!(info.user_id, "Ubot");
        assert_eq!(info.display_name.as_deref(), Some("Kogoto"));
    }
}
