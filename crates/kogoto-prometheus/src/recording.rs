// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade. Without an installed recorder every call is a
//! no-op, so the relay records unconditionally.

use metrics::{describe_counter, describe_histogram};

/// Register all Kogoto metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "kogoto_complaints_total",
        "Inbound complaints by intake outcome"
    );
    describe_counter!(
        "kogoto_care_messages_total",
        "Care messages pushed back to senders"
    );
    describe_counter!("kogoto_batches_total", "Delivery batch runs by result");
    describe_counter!(
        "kogoto_groups_total",
        "Per-sender delivery groups by outcome"
    );
    describe_counter!(
        "kogoto_deliveries_total",
        "Combined messages pushed to recipients"
    );
    describe_histogram!(
        "kogoto_batch_duration_seconds",
        "Wall time of one delivery batch run"
    );
}

/// Record one intake outcome (`recorded`, `duplicate`, `ignored`, `failed`).
pub fn record_complaint(outcome: &'static str) {
    metrics::counter!("kogoto_complaints_total", "outcome" => outcome).increment(1);
}

pub fn record_care_message() {
    metrics::counter!("kogoto_care_messages_total").increment(1);
}

/// Record one batch run (`completed`, `empty`, `skipped`, `failed`).
pub fn record_batch(result: &'static str, seconds: f64) {
    metrics::counter!("kogoto_batches_total", "result" => result).increment(1);
    metrics::histogram!("kogoto_batch_duration_seconds").record(seconds);
}

/// Record one group outcome (`delivered`, `no_recipient`, `outside_window`, `failed`).
pub fn record_group(outcome: &'static str) {
    metrics::counter!("kogoto_groups_total", "outcome" => outcome).increment(1);
}

pub fn record_delivery() {
    metrics::counter!("kogoto_deliveries_total").increment(1);
}
