// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic driver for [`DeliveryScheduler::run_batch`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::scheduler::DeliveryScheduler;

/// Spawns the batch timer.
///
/// Runs a batch every `interval_secs`, plus once after `startup_delay_secs`
/// when `run_on_startup` is set. Returns `None` when the scheduler is
/// disabled. The task exits when `cancel` fires; a batch already running is
/// allowed to finish.
pub fn spawn_scheduler(
    scheduler: Arc<DeliveryScheduler>,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let config = scheduler.config().clone();
    if !config.enabled {
        info!("delivery scheduler disabled");
        return None;
    }

    let period = Duration::from_secs(config.interval_secs.max(1));
    info!(
        interval_secs = period.as_secs(),
        batch_size = config.batch_size,
        "delivery scheduler started"
    );

    Some(tokio::spawn(async move {
        if config.run_on_startup {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(config.startup_delay_secs)) => {
                    run_once(&scheduler).await;
                }
                _ = cancel.cancelled() => {
                    info!("delivery scheduler stopped");
                    return;
                }
            }
        }

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => run_once(&scheduler).await,
                _ = cancel.cancelled() => {
                    info!("delivery scheduler stopped");
                    break;
                }
            }
        }
    }))
}

async fn run_once(scheduler: &DeliveryScheduler) {
    match scheduler.run_batch().await {
        Ok(report) => debug!(
            fetched = report.fetched,
            delivered = report.delivered(),
            skipped = report.skipped_in_progress,
            "scheduled batch finished"
        ),
        Err(e) => error!(error = %e, "scheduled batch failed"),
    }
}
