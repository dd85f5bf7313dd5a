// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Dify chat-messages API.
//!
//! Provides [`DifyClient`] which handles authentication, blocking-mode
//! requests, and a single retry on transient errors.

use std::time::Duration;

use kogoto_core::KogotoError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatMessageRequest, ChatMessageResponse};

/// HTTP client for Dify API communication.
#[derive(Debug, Clone)]
pub struct DifyClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl DifyClient {
    /// Creates a client for the app behind `api_key`.
    ///
    /// `api_url` is the API root (e.g. `https://api.dify.ai/v1`); requests go
    /// to `{api_url}/chat-messages`.
    pub fn new(api_key: &str, api_url: &str, timeout: Duration) -> Result<Self, KogotoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| KogotoError::Config(format!("invalid Dify API key header value: {e}")))?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| KogotoError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat-messages", api_url.trim_end_matches('/')),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the retry delay (for tests against wiremock).
    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends one blocking chat request and returns the `answer` text.
    ///
    /// On transient errors (429, 500, 503), retries once after a short delay.
    pub async fn chat(&self, query: &str, user: &str) -> Result<String, KogotoError> {
        let request = ChatMessageRequest::blocking(query, user);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Dify request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| KogotoError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, user, "Dify response received");

            if status.is_success() {
                let body: ChatMessageResponse =
                    response.json().await.map_err(|e| KogotoError::Provider {
                        message: format!("failed to parse Dify response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(body.answer);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient Dify error, will retry");
                last_error = Some(KogotoError::provider(format!("Dify returned {status}: {body}")));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("Dify API error ({}): {}", api_err.code, api_err.message),
                Err(_) => format!("Dify returned {status}: {body}"),
            };
            return Err(KogotoError::provider(message));
        }

        Err(last_error.unwrap_or_else(|| KogotoError::provider("Dify request failed after retries")))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> DifyClient {
        DifyClient::new("app-test-key", &format!("{}/v1/", server.uri()), Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn chat_returns_answer_and_sends_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .and(header("authorization", "Bearer app-test-key"))
            .and(body_partial_json(serde_json::json!({
                "query": "hello",
                "response_mode": "blocking",
                "user": "kogoto-classifier",
                "inputs": {}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "hi there"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let answer = test_client(&server).chat("hello", "kogoto-classifier").await.unwrap();
        assert_eq!(answer, "hi there");
    }

    #[tokio::test]
    async fn chat_retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "after retry"})),
            )
            .mount(&server)
            .await;

        let answer = test_client(&server).chat("q", "u").await.unwrap();
        assert_eq!(answer, "after retry");
    }

    #[tokio::test]
    async fn chat_reports_api_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "invalid_param",
                "message": "query is required",
                "status": 400
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).chat("", "u").await.unwrap_err().to_string();
        assert!(err.contains("invalid_param"), "got: {err}");
    }

    #[tokio::test]
    async fn chat_gives_up_after_second_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server).chat("q", "u").await.unwrap_err().to_string();
        assert!(err.contains("500"), "got: {err}");
    }
}
