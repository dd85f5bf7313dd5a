// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery batch job.
//!
//! Each run fetches the oldest unprocessed complaints, groups them by sender,
//! and for every group with a linked recipient inside that recipient's
//! delivery window composes one message, pushes it, records the delivery, and
//! marks the group's complaints processed. Groups fail independently.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveTime, Timelike};
use kogoto_config::model::SchedulerConfig;
use kogoto_core::{
    ComplaintRecord, ComposerAdapter, KogotoError, NewMessageHistory, SYSTEM_SENDER_ID,
    SendingTime, StorageAdapter, TransportAdapter,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Result of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Number of unprocessed complaints fetched.
    pub fetched: usize,
    pub groups: Vec<GroupReport>,
    /// True when another run held the guard and this one did nothing.
    pub skipped_in_progress: bool,
}

impl BatchReport {
    /// Number of groups that were pushed to a recipient.
    pub fn delivered(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.outcome, GroupOutcome::Delivered { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub sender_id: String,
    pub complaint_ids: Vec<i64>,
    pub outcome: GroupOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    Delivered { recipient_id: String, marked: usize },
    NoRecipient,
    OutsideWindow { recipient_id: String },
    Failed { reason: String },
}

impl GroupOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            GroupOutcome::Delivered { .. } => "delivered",
            GroupOutcome::NoRecipient => "no_recipient",
            GroupOutcome::OutsideWindow { .. } => "outside_window",
            GroupOutcome::Failed { .. } => "failed",
        }
    }
}

/// Runs delivery batches. At most one batch runs at a time.
pub struct DeliveryScheduler {
    storage: Arc<dyn StorageAdapter>,
    composer: Arc<dyn ComposerAdapter>,
    transport: Arc<dyn TransportAdapter>,
    config: SchedulerConfig,
    guard: Mutex<()>,
}

impl DeliveryScheduler {
    /// `transport` is the recipient-side channel.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        composer: Arc<dyn ComposerAdapter>,
        transport: Arc<dyn TransportAdapter>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            composer,
            transport,
            config,
            guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs one batch against the local wall clock.
    pub async fn run_batch(&self) -> Result<BatchReport, KogotoError> {
        self.run_batch_at(chrono::Local::now().time()).await
    }

    /// Runs one batch as if the local time were `now`.
    pub async fn run_batch_at(&self, now: NaiveTime) -> Result<BatchReport, KogotoError> {
        let Ok(_running) = self.guard.try_lock() else {
            info!("batch already in progress, skipping");
            kogoto_prometheus::record_batch("skipped", 0.0);
            return Ok(BatchReport {
                skipped_in_progress: true,
                ..BatchReport::default()
            });
        };

        let started = Instant::now();
        let result = self.run_locked(now).await;
        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(report) if report.fetched == 0 => kogoto_prometheus::record_batch("empty", elapsed),
            Ok(_) => kogoto_prometheus::record_batch("completed", elapsed),
            Err(_) => kogoto_prometheus::record_batch("failed", elapsed),
        }
        result
    }

    async fn run_locked(&self, now: NaiveTime) -> Result<BatchReport, KogotoError> {
        let complaints = self
            .storage
            .list_unprocessed_complaints(self.config.batch_size)
            .await?;
        if complaints.is_empty() {
            debug!("no unprocessed complaints");
            return Ok(BatchReport::default());
        }

        let fetched = complaints.len();
        info!(fetched, "starting delivery batch");

        let now_minutes = now.hour() * 60 + now.minute();
        let mut groups = Vec::new();
        for (sender_id, records) in group_by_sender(complaints) {
            let outcome = match self.deliver_group(&sender_id, &records, now_minutes).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(sender_id = %sender_id, error = %e, "delivery group failed");
                    GroupOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            kogoto_prometheus::record_group(outcome.metric_label());
            groups.push(GroupReport {
                sender_id,
                complaint_ids: records.iter().map(|r| r.id).collect(),
                outcome,
            });
        }

        let report = BatchReport {
            fetched,
            groups,
            skipped_in_progress: false,
        };
        info!(
            fetched = report.fetched,
            delivered = report.delivered(),
            "delivery batch finished"
        );
        Ok(report)
    }

    async fn deliver_group(
        &self,
        sender_id: &str,
        records: &[ComplaintRecord],
        now_minutes: u32,
    ) -> Result<GroupOutcome, KogotoError> {
        let Some(recipient_id) = self.storage.find_recipient_for_sender(sender_id).await? else {
            info!(sender_id, "no recipient linked, leaving complaints pending");
            return Ok(GroupOutcome::NoRecipient);
        };

        if let Some(settings) = self.storage.get_user_settings(&recipient_id).await? {
            match settings.sending_time.parse::<SendingTime>() {
                Ok(time) => {
                    if !within_window(
                        time.minutes_since_midnight(),
                        now_minutes,
                        self.config.window_minutes,
                    ) {
                        debug!(
                            recipient_id = %recipient_id,
                            sending_time = %time,
                            "outside delivery window"
                        );
                        return Ok(GroupOutcome::OutsideWindow { recipient_id });
                    }
                }
                Err(e) => {
                    warn!(
                        recipient_id = %recipient_id,
                        error = %e,
                        "stored sending time is invalid, delivering without gate"
                    );
                }
            }
        }

        let message = self.composer.compose_for_recipient(records).await?;
        self.transport.push(&recipient_id, &message).await?;
        kogoto_prometheus::record_delivery();
        info!(
            sender_id,
            recipient_id = %recipient_id,
            complaints = records.len(),
            "delivered combined message"
        );

        let entry = NewMessageHistory {
            sender_id: SYSTEM_SENDER_ID.to_string(),
            receiver_id: recipient_id.clone(),
            content: message,
        };
        if let Err(e) = self.storage.append_message_history(&entry).await {
            warn!(recipient_id = %recipient_id, error = %e, "failed to record message history");
        }

        let mut marked = 0;
        for record in records {
            match self.storage.mark_complaint_processed(record.id).await {
                Ok(true) => marked += 1,
                Ok(false) => warn!(complaint_id = record.id, "complaint was already processed"),
                Err(e) => {
                    error!(complaint_id = record.id, error = %e, "failed to mark complaint processed")
                }
            }
        }

        Ok(GroupOutcome::Delivered {
            recipient_id,
            marked,
        })
    }
}

/// Groups complaints by sender. Groups appear in order of first occurrence,
/// and records keep their input order within a group.
pub fn group_by_sender(complaints: Vec<ComplaintRecord>) -> Vec<(String, Vec<ComplaintRecord>)> {
    let mut groups: Vec<(String, Vec<ComplaintRecord>)> = Vec::new();
    for complaint in complaints {
        match groups.iter_mut().find(|(id, _)| *id == complaint.sender_id) {
            Some((_, records)) => records.push(complaint),
            None => groups.push((complaint.sender_id.clone(), vec![complaint])),
        }
    }
    groups
}

/// True when `now` is at most `window` minutes from `setting`. Both are minutes
/// since midnight; the distance does not wrap across midnight.
pub fn within_window(setting: u32, now: u32, window: u32) -> bool {
    setting.abs_diff(now) <= window
}
