// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kogoto serve` and `kogoto run-batch`.
//!
//! Wires storage, the Dify provider, both LINE channels, the relay
//! components, and the gateway from a validated [`KogotoConfig`].

use std::sync::Arc;

use kogoto_config::KogotoConfig;
use kogoto_core::{KogotoError, PluginAdapter, StorageAdapter};
use kogoto_dify::DifyProvider;
use kogoto_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use kogoto_line::{ChannelRole, LineChannel};
use kogoto_prometheus::PrometheusAdapter;
use kogoto_relay::{
    DeliveryScheduler, IntakeHandler, RecipientHandler, install_signal_handler, spawn_scheduler,
};
use kogoto_storage::SqliteStorage;
use tracing::{info, warn};

/// Crates whose spans and events follow `[server] log_level`.
const LOG_TARGETS: &[&str] = &[
    "kogoto",
    "kogoto_core",
    "kogoto_config",
    "kogoto_storage",
    "kogoto_dify",
    "kogoto_line",
    "kogoto_prometheus",
    "kogoto_relay",
    "kogoto_gateway",
];

/// Everything a running relay holds on to.
pub(crate) struct Components {
    pub storage: Arc<SqliteStorage>,
    pub state: GatewayState,
}

/// Opens storage and builds every adapter and handler.
///
/// Fails on missing credentials before any network traffic happens.
pub(crate) async fn build_components(
    config: &KogotoConfig,
    prometheus: Option<Arc<PrometheusAdapter>>,
) -> Result<Components, KogotoError> {
    let dify = Arc::new(DifyProvider::new(&config.dify)?);
    let sender = Arc::new(LineChannel::new(
        ChannelRole::Sender,
        &config.line.sender,
        &config.line,
    )?);
    let recipient = Arc::new(LineChannel::new(
        ChannelRole::Recipient,
        &config.line.recipient,
        &config.line,
    )?);

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    let store: Arc<dyn StorageAdapter> = storage.clone();

    let intake = Arc::new(IntakeHandler::new(
        dify.clone(),
        dify.clone(),
        store.clone(),
        sender.clone(),
        config.relay.clone(),
    ));
    let scheduler = Arc::new(DeliveryScheduler::new(
        store.clone(),
        dify.clone(),
        recipient.clone(),
        config.scheduler.clone(),
    ));
    let recipient_handler = Arc::new(RecipientHandler::new(
        store.clone(),
        recipient.clone(),
        &config.relay,
    )?);

    let mut adapters = vec![
        storage.clone() as Arc<dyn PluginAdapter>,
        dify as Arc<dyn PluginAdapter>,
        sender as Arc<dyn PluginAdapter>,
        recipient as Arc<dyn PluginAdapter>,
    ];
    let prometheus_render = prometheus.map(|adapter| {
        adapters.push(adapter.clone());
        Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
    });

    if config.gateway.admin_token.is_none() {
        warn!("gateway.admin_token is not set, every /api request will be rejected");
    }

    let state = GatewayState {
        intake,
        recipient: recipient_handler,
        scheduler,
        storage: store,
        auth: AuthConfig {
            bearer_token: config.gateway.admin_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            adapters,
            prometheus_render,
        },
    };

    Ok(Components { storage, state })
}

/// Runs the gateway and the scheduler until SIGINT or SIGTERM.
pub async fn run_serve(config: KogotoConfig) -> Result<(), KogotoError> {
    init_tracing(&config.server.log_level);

    info!("starting kogoto serve");

    let prometheus = if config.prometheus.enabled {
        match PrometheusAdapter::new() {
            Ok(adapter) => {
                info!("prometheus metrics enabled");
                Some(Arc::new(adapter))
            }
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        None
    };

    let Components { storage, state } = build_components(&config, prometheus).await?;

    let cancel = install_signal_handler();
    let scheduler_task = spawn_scheduler(state.scheduler.clone(), cancel.clone());

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let served = kogoto_gateway::start_server(&server_config, state, cancel.clone()).await;

    // A bind failure must also stop the scheduler.
    cancel.cancel();
    if let Some(task) = scheduler_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "scheduler task ended abnormally");
    }

    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    served?;
    info!("kogoto serve shutdown complete");
    Ok(())
}

/// Runs a single delivery batch and prints its report.
pub async fn run_batch_once(config: KogotoConfig) -> Result<(), KogotoError> {
    init_tracing(&config.server.log_level);

    let Components { storage, state } = build_components(&config, None).await?;
    let report = state.scheduler.run_batch().await;
    let closed = storage.close().await;
    let report = report?;
    closed?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| KogotoError::Internal(format!("failed to render batch report: {e}")))?;
    println!("{json}");
    Ok(())
}

/// `RUST_LOG` syntax applied when the variable is unset.
fn default_filter(log_level: &str) -> String {
    std::iter::once("warn".to_string())
        .chain(LOG_TARGETS.iter().map(|target| format!("{target}={log_level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(dir: &tempfile::TempDir) -> KogotoConfig {
        let mut config = KogotoConfig::default();
        config.dify.api_key = Some("app-key".into());
        config.line.sender.channel_access_token = Some("sender-token".into());
        config.line.recipient.channel_access_token = Some("recipient-token".into());
        config.gateway.admin_token = Some("admin".into());
        config.storage.database_path = dir.path().join("kogoto.db").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn default_filter_covers_every_crate() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("kogoto=debug"));
        assert!(filter.contains("kogoto_relay=debug"));
        assert!(filter.contains("kogoto_gateway=debug"));
        assert_eq!(filter.matches("=debug").count(), LOG_TARGETS.len());
    }

    #[tokio::test]
    async fn missing_dify_key_fails_before_opening_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = configured(&dir);
        config.dify.api_key = None;

        let err = build_components(&config, None).await.err().unwrap();
        assert!(matches!(err, KogotoError::Config(_)));
        assert!(!dir.path().join("kogoto.db").exists());
    }

    #[tokio::test]
    async fn missing_recipient_token_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = configured(&dir);
        config.line.recipient.channel_access_token = Some("  ".into());

        let err = build_components(&config, None).await.err().unwrap();
        assert!(err.to_string().contains("line-recipient"));
    }

    #[tokio::test]
    async fn builds_components_and_lists_adapters() {
        let dir = tempfile::tempdir().unwrap();
        let config = configured(&dir);

        let components = build_components(&config, None).await.unwrap();
        let names: Vec<String> = components
            .state
            .health
            .adapters
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, ["sqlite", "dify", "line-sender", "line-recipient"]);
        assert!(components.state.health.prometheus_render.is_none());
        assert_eq!(components.state.auth.bearer_token.as_deref(), Some("admin"));

        components.storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_default_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = configured(&dir);
        config.relay.default_sending_time = "25:00".into();

        let err = build_components(&config, None).await.err().unwrap();
        assert!(err.to_string().contains("relay.default_sending_time"));
    }
}
