// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Complaint intake: classify, persist, acknowledge, and optionally push a
//! care message back to the sender.

use std::sync::Arc;

use kogoto_config::model::RelayConfig;
use kogoto_core::{
    ClassifierAdapter, ComplaintRecord, ComposerAdapter, EventContent, InboundEvent, KogotoError,
    MessageEvent, NewComplaint, StorageAdapter, TransportAdapter,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Reply sent after a complaint has been recorded.
pub const ACK_TEXT: &str =
    "Thank you for sharing. Your message has been recorded and will be passed on gently.";

/// Reply sent when classification or persistence fails.
pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong while recording your message. Please try again later.";

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Not a text message, or no sender or text.
    Ignored,
    /// A redelivery of an event that is already stored.
    Duplicate,
    Recorded {
        complaint_id: i64,
        care_message_sent: bool,
    },
    /// Classification or persistence failed; the sender got the apology.
    Failed { reason: String },
}

impl IntakeOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            IntakeOutcome::Ignored => "ignored",
            IntakeOutcome::Duplicate => "duplicate",
            IntakeOutcome::Recorded { .. } => "recorded",
            IntakeOutcome::Failed { .. } => "failed",
        }
    }
}

/// Processes sender-side complaint events.
pub struct IntakeHandler {
    classifier: Arc<dyn ClassifierAdapter>,
    composer: Arc<dyn ComposerAdapter>,
    storage: Arc<dyn StorageAdapter>,
    transport: Arc<dyn TransportAdapter>,
    config: RelayConfig,
}

impl IntakeHandler {
    /// `transport` is the sender-side channel; both the acknowledgment and
    /// the care message go through it.
    pub fn new(
        classifier: Arc<dyn ClassifierAdapter>,
        composer: Arc<dyn ComposerAdapter>,
        storage: Arc<dyn StorageAdapter>,
        transport: Arc<dyn TransportAdapter>,
        config: RelayConfig,
    ) -> Self {
        Self {
            classifier,
            composer,
            storage,
            transport,
            config,
        }
    }

    /// Handles one event end-to-end.
    ///
    /// Returns `Err` only when the acknowledgment or apology reply could not
    /// be sent. Every other failure is reported through the outcome.
    pub async fn handle(&self, event: InboundEvent) -> Result<IntakeOutcome, KogotoError> {
        let outcome = self.handle_inner(event).await;
        if let Ok(outcome) = &outcome {
            kogoto_prometheus::record_complaint(outcome.metric_label());
        }
        outcome
    }

    async fn handle_inner(&self, event: InboundEvent) -> Result<IntakeOutcome, KogotoError> {
        let InboundEvent::Message(message) = event else {
            debug!("ignoring non-message event");
            return Ok(IntakeOutcome::Ignored);
        };
        let EventContent::Text(text) = &message.content else {
            debug!(sender_id = %message.sender_id, "ignoring non-text message");
            return Ok(IntakeOutcome::Ignored);
        };
        if message.sender_id.is_empty() || text.trim().is_empty() {
            debug!("ignoring message without sender or text");
            return Ok(IntakeOutcome::Ignored);
        }

        if self.is_duplicate(&message).await {
            info!(
                sender_id = %message.sender_id,
                event_id = message.event_id.as_deref().unwrap_or_default(),
                "skipping redelivered event"
            );
            return Ok(IntakeOutcome::Duplicate);
        }

        let record = match self.classify_and_store(&message, text).await {
            Ok(record) => record,
            Err(e) => {
                error!(sender_id = %message.sender_id, error = %e, "complaint intake failed");
                self.reply(&message, APOLOGY_TEXT).await?;
                return Ok(IntakeOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };
        info!(
            sender_id = %record.sender_id,
            complaint_id = record.id,
            "complaint recorded"
        );

        self.reply(&message, ACK_TEXT).await?;

        let care_message_sent = self.maybe_send_care(&record).await;
        Ok(IntakeOutcome::Recorded {
            complaint_id: record.id,
            care_message_sent,
        })
    }

    async fn is_duplicate(&self, message: &MessageEvent) -> bool {
        if !self.config.dedupe_redeliveries {
            return false;
        }
        let Some(event_id) = message.event_id.as_deref() else {
            return false;
        };
        match self.storage.complaint_exists_for_event(event_id).await {
            Ok(exists) => exists,
            Err(e) => {
                // Fall through to a normal intake; the unique index still
                // rejects a second row for the same event id.
                warn!(event_id, error = %e, "redelivery check failed");
                false
            }
        }
    }

    async fn classify_and_store(
        &self,
        message: &MessageEvent,
        text: &str,
    ) -> Result<ComplaintRecord, KogotoError> {
        let result = self.classifier.classify(text).await?;
        debug!(
            sender_id = %message.sender_id,
            sentiment = %result.sentiment,
            score = result.score,
            "complaint classified"
        );

        let complaint = NewComplaint {
            sender_id: message.sender_id.clone(),
            event_id: message.event_id.clone(),
            original_text: text.to_string(),
            sentiment_analysis: Some(result.analysis()),
            summary: Some(result.summary),
        };
        self.storage.insert_complaint(&complaint).await
    }

    async fn reply(&self, message: &MessageEvent, text: &str) -> Result<(), KogotoError> {
        match message.reply_token.as_deref() {
            Some(token) => self.transport.reply(token, text).await,
            None => Ok(()),
        }
    }

    /// Pushes a care message for strongly negative complaints. Failures are
    /// logged and reported as "not sent".
    async fn maybe_send_care(&self, record: &ComplaintRecord) -> bool {
        let strongly_negative = record
            .sentiment_analysis
            .is_some_and(|a| a.is_strongly_negative(self.config.care_score_threshold));
        if !strongly_negative {
            return false;
        }

        let message = match self
            .composer
            .compose_care_message(std::slice::from_ref(record))
            .await
        {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(complaint_id = record.id, "composer declined care message");
                return false;
            }
            Err(e) => {
                warn!(complaint_id = record.id, error = %e, "care message composition failed");
                return false;
            }
        };

        match self.transport.push(&record.sender_id, &message).await {
            Ok(()) => {
                info!(sender_id = %record.sender_id, "care message sent");
                kogoto_prometheus::record_care_message();
                true
            }
            Err(e) => {
                warn!(sender_id = %record.sender_id, error = %e, "care message push failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kogoto_core::{MessageEvent, Sentiment};
    use kogoto_test_utils::{MemoryStorage, MockClassifier, MockComposer, MockTransport};

    struct Fixture {
        classifier: Arc<MockClassifier>,
        composer: Arc<MockComposer>,
        storage: Arc<MemoryStorage>,
        transport: Arc<MockTransport>,
        handler: IntakeHandler,
    }

    fn fixture() -> Fixture {
        let classifier = Arc::new(MockClassifier::new());
        let composer = Arc::new(MockComposer::new());
        let storage = Arc::new(MemoryStorage::new());
        let transport = Arc::new(MockTransport::new());
        let handler = IntakeHandler::new(
            classifier.clone(),
            composer.clone(),
            storage.clone(),
            transport.clone(),
            RelayConfig::default(),
        );
        Fixture {
            classifier,
            composer,
            storage,
            transport,
            handler,
        }
    }

    fn webhook_text(sender: &str, text: &str, event_id: Option<&str>) -> InboundEvent {
        InboundEvent::Message(MessageEvent {
            event_id: event_id.map(String::from),
            sender_id: sender.into(),
            reply_token: Some("rt".into()),
            is_redelivery: false,
            content: EventContent::Text(text.into()),
        })
    }

    #[tokio::test]
    async fn records_and_acknowledges_text() {
        let f = fixture();
        f.classifier
            .push_result(Sentiment::Neutral, 0.5, "chores")
            .await;

        let outcome = f
            .handler
            .handle(webhook_text("w1", "dishes again", None))
            .await
            .unwrap();

        let IntakeOutcome::Recorded {
            complaint_id,
            care_message_sent,
        } = outcome
        else {
            panic!("unexpected {outcome:?}");
        };
        assert!(!care_message_sent);
        let stored = f.storage.get_complaint(complaint_id).await.unwrap().unwrap();
        assert_eq!(stored.original_text, "dishes again");
        assert_eq!(stored.summary.as_deref(), Some("chores"));
        assert!(!stored.processed);
        assert_eq!(f.transport.replies().await, vec![("rt".into(), ACK_TEXT.into())]);
        assert!(f.transport.pushes().await.is_empty());
    }

    #[tokio::test]
    async fn care_threshold_is_strict() {
        let f = fixture();
        f.classifier.push_result(Sentiment::Negative, 0.7, "s").await;
        f.handler.handle(webhook_text("w1", "a", None)).await.unwrap();
        assert_eq!(f.composer.care_calls().await, 0);

        f.classifier.push_result(Sentiment::Negative, 0.71, "s").await;
        f.composer.set_care_message(Some("hang in there".into())).await;
        let outcome = f.handler.handle(webhook_text("w1", "b", None)).await.unwrap();
        assert!(matches!(
            outcome,
            IntakeOutcome::Recorded {
                care_message_sent: true,
                ..
            }
        ));
        assert_eq!(f.composer.care_calls().await, 1);
        assert_eq!(
            f.transport.pushes().await,
            vec![("w1".into(), "hang in there".into())]
        );
    }

    #[tokio::test]
    async fn care_none_sends_nothing() {
        let f = fixture();
        f.classifier.push_result(Sentiment::Negative, 0.9, "s").await;
        f.composer.set_care_message(None).await;

        let outcome = f.handler.handle(webhook_text("w1", "a", None)).await.unwrap();
        assert!(matches!(
            outcome,
            IntakeOutcome::Recorded {
                care_message_sent: false,
                ..
            }
        ));
        assert!(f.transport.pushes().await.is_empty());
    }

    #[tokio::test]
    async fn care_push_failure_keeps_record_and_single_reply() {
        let f = fixture();
        f.classifier.push_result(Sentiment::Negative, 0.95, "s").await;
        f.composer.set_care_message(Some("care".into())).await;
        f.transport.fail_pushes(true);

        let outcome = f.handler.handle(webhook_text("w1", "a", None)).await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Recorded { care_message_sent: false, .. }));
        assert_eq!(f.storage.complaint_count().await, 1);
        assert_eq!(f.transport.replies().await.len(), 1);
    }

    #[tokio::test]
    async fn classifier_failure_apologizes_without_record() {
        let f = fixture();
        f.classifier.fail_next(true);

        let outcome = f.handler.handle(webhook_text("w1", "a", None)).await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Failed { .. }));
        assert_eq!(f.storage.complaint_count().await, 0);
        assert_eq!(f.transport.replies().await, vec![("rt".into(), APOLOGY_TEXT.into())]);
    }

    #[tokio::test]
    async fn storage_failure_apologizes() {
        let f = fixture();
        f.storage.fail_writes(true);

        let outcome = f.handler.handle(webhook_text("w1", "a", None)).await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Failed { .. }));
        assert_eq!(f.transport.replies().await[0].1, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn ack_failure_is_an_error() {
        let f = fixture();
        f.transport.fail_replies(true);

        let result = f.handler.handle(webhook_text("w1", "a", None)).await;
        assert!(result.is_err());
        // the record itself was still persisted
        assert_eq!(f.storage.complaint_count().await, 1);
    }

    #[tokio::test]
    async fn ignores_non_text_and_blank_events() {
        let f = fixture();
        let sticker = InboundEvent::Message(MessageEvent {
            event_id: None,
            sender_id: "w1".into(),
            reply_token: Some("rt".into()),
            is_redelivery: false,
            content: EventContent::Other,
        });

        for event in [
            InboundEvent::Other,
            sticker,
            webhook_text("w1", "   ", None),
            webhook_text("", "hello", None),
        ] {
            assert_eq!(f.handler.handle(event).await.unwrap(), IntakeOutcome::Ignored);
        }
        assert_eq!(f.classifier.calls().await, 0);
        assert!(f.transport.replies().await.is_empty());
    }

    #[tokio::test]
    async fn redelivered_event_is_not_recorded_twice() {
        let f = fixture();
        f.handler
            .handle(webhook_text("w1", "a", Some("ev-1")))
            .await
            .unwrap();
        let second = f
            .handler
            .handle(webhook_text("w1", "a", Some("ev-1")))
            .await
            .unwrap();

        assert_eq!(second, IntakeOutcome::Duplicate);
        assert_eq!(f.storage.complaint_count().await, 1);
        assert_eq!(f.classifier.calls().await, 1);
        assert_eq!(f.transport.replies().await.len(), 1);
    }

    #[tokio::test]
    async fn admin_submission_skips_reply() {
        let f = fixture();
        let outcome = f.handler.handle(InboundEvent::text("w1", "a")).await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Recorded { .. }));
        assert!(f.transport.replies().await.is_empty());
    }
}
