// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional feeder that replays validation-holdout messages through the
//! queue, so a freshly started system has labeled traffic to score.

use std::time::Duration;

use smsift_config::model::SimulatorConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::QueueService;

/// Long-running feeder worker.
pub struct SimulatorRunner {
    queue: QueueService,
    config: SimulatorConfig,
}

impl SimulatorRunner {
    pub fn new(queue: QueueService, config: SimulatorConfig) -> Self {
        Self { queue, config }
    }

    /// Enqueue a labeled batch every interval until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_ms = self.config.interval_ms,
            batch_size = self.config.batch_size,
            "simulator started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self
                .queue
                .enqueue_from_validation(self.config.batch_size, true)
                .await
            {
                Ok(batch) if batch.is_empty() => {
                    debug!("simulator: no holdout messages available");
                }
                Ok(batch) => {
                    debug!(count = batch.len(), "simulator batch enqueued");
                }
                Err(e) => {
                    warn!(error = %e, "simulator enqueue failed");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(self.config.interval_ms)) => {}
            }
        }

        info!("simulator stopped");
    }
}
