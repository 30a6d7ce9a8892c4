// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring agent runner: a long-running claim -> score -> emit loop.
//!
//! Each tick opens fresh per-iteration state; nothing mutable is shared
//! across iterations. Pace is adaptive: an idle queue, a missing model,
//! and a failed tick each select their own delay. Cancellation interrupts
//! both the work and the sleeps.

use std::sync::Arc;
use std::time::Duration;

use smsift_config::model::ScorerConfig;
use smsift_core::{EventObserver, SmsiftError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::queue::QueueService;
use crate::scoring::ScoringService;

/// What one tick accomplished; selects the following delay.
enum Tick {
    NotReady,
    Idle,
    Scored,
}

/// Long-running scoring worker.
pub struct ScoringRunner {
    queue: QueueService,
    scoring: ScoringService,
    observer: Arc<dyn EventObserver>,
    config: ScorerConfig,
    worker_id: usize,
}

impl ScoringRunner {
    pub fn new(
        queue: QueueService,
        scoring: ScoringService,
        observer: Arc<dyn EventObserver>,
        config: ScorerConfig,
        worker_id: usize,
    ) -> Self {
        Self {
            queue,
            scoring,
            observer,
            config,
            worker_id,
        }
    }

    /// Run until cancelled. Errors are logged and retried after the error
    /// delay; the loop never terminates the process.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(worker = self.worker_id, "scoring worker started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let delay = match self.tick(&cancel).await {
                Ok(Tick::NotReady) => Duration::from_millis(self.config.not_ready_delay_ms),
                Ok(Tick::Idle) => Duration::from_millis(self.config.idle_delay_ms),
                Ok(Tick::Scored) => Duration::from_millis(self.config.busy_delay_ms),
                Err(SmsiftError::Cancelled) => break,
                Err(e) => {
                    warn!(worker = self.worker_id, error = %e, "scoring tick failed");
                    Duration::from_millis(self.config.error_delay_ms)
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(worker = self.worker_id, "scoring worker stopped");
    }

    async fn tick(&self, cancel: &CancellationToken) -> Result<Tick, SmsiftError> {
        // Check readiness before claiming so no message is pulled into
        // Processing just to fail NotReady.
        if !self.scoring.is_ready().await? {
            return Ok(Tick::NotReady);
        }

        let Some(message) = self.queue.claim_next(cancel).await? else {
            return Ok(Tick::Idle);
        };

        let outcome = self.scoring.score_message(&message).await?;
        self.observer.on_score(&outcome);
        Ok(Tick::Scored)
    }
}
