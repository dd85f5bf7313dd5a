// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Kogoto.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method,
//! which is exposed through the gateway's /metrics endpoint.

pub mod recording;

use async_trait::async_trait;
use kogoto_core::{AdapterType, HealthStatus, KogotoError, PluginAdapter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub use recording::{
    record_batch, record_care_message, record_complaint, record_delivery, record_group,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, KogotoError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            KogotoError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wraps a handle from a recorder that was built but not installed.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global recorder can only be installed once per process, so these
    // tests use a local recorder.
    fn local_adapter() -> (PrometheusAdapter, metrics_exporter_prometheus::PrometheusRecorder) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let adapter = PrometheusAdapter::from_handle(recorder.handle());
        (adapter, recorder)
    }

    #[test]
    fn recorded_counters_render_with_labels() {
        let (adapter, recorder) = local_adapter();
        metrics::with_local_recorder(&recorder, || {
            record_complaint("recorded");
            record_complaint("recorded");
            record_group("no_recipient");
            record_delivery();
        });

        let text = adapter.render();
        assert!(text.contains(r#"kogoto_complaints_total{outcome="recorded"} 2"#), "{text}");
        assert!(text.contains(r#"kogoto_groups_total{outcome="no_recipient"} 1"#), "{text}");
        assert!(text.contains("kogoto_deliveries_total 1"), "{text}");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_care_message();
        record_batch("empty", 0.01);
    }

    #[tokio::test]
    async fn plugin_adapter_metadata() {
        let (adapter, _recorder) = local_adapter();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Observability);
        assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
