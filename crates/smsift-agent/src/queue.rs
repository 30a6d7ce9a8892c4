// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue service: enqueue, exclusive claim, and status-partition counts.
//!
//! The queue is a logical view over `messages.status`, not a separate
//! structure. Exclusive claim rests on the store's conditional update:
//! of any number of concurrent claimers, exactly one observes an affected
//! count of 1 for a given `Queued -> Processing` transition.

use std::collections::HashMap;

use smsift_core::types::{MessageStatus, SmsMessage};
use smsift_core::SmsiftError;
use smsift_storage::queries::messages;
use smsift_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Service wrapper over the queue partition of the message table.
#[derive(Clone)]
pub struct QueueService {
    db: Database,
}

impl QueueService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new runtime message in `Queued` state.
    ///
    /// Always creates a fresh row; idempotence is the caller's concern.
    pub async fn enqueue(&self, text: &str) -> Result<SmsMessage, SmsiftError> {
        if text.trim().is_empty() {
            return Err(SmsiftError::InvalidInput(
                "message text must not be empty".to_string(),
            ));
        }
        let msg = messages::insert_runtime(&self.db, text).await?;
        debug!(message_id = msg.id, "message enqueued");
        Ok(msg)
    }

    /// Copy up to `n` unconsumed holdout originals into the queue,
    /// optionally carrying their labels for offline accuracy measurement.
    ///
    /// Consumed originals are marked in the same transaction; an exhausted
    /// pool is reset and retried once. Returns the created rows directly.
    pub async fn enqueue_from_validation(
        &self,
        n: usize,
        copy_label: bool,
    ) -> Result<Vec<SmsMessage>, SmsiftError> {
        let created = messages::enqueue_from_validation(&self.db, n, copy_label).await?;
        debug!(count = created.len(), "validation messages enqueued");
        Ok(created)
    }

    /// Claim exclusive ownership of the oldest `Queued` message.
    ///
    /// Select the oldest candidate, then conditionally update it; if
    /// another worker won the race, start over. Returns `None` when the
    /// queue is empty and `Cancelled` as soon as cancellation is signalled,
    /// leaving every message fully `Queued` or fully `Processing`.
    pub async fn claim_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<SmsMessage>, SmsiftError> {
        loop {
            if cancel.is_cancelled() {
                return Err(SmsiftError::Cancelled);
            }

            let Some(candidate) = messages::oldest_queued_id(&self.db).await? else {
                return Ok(None);
            };

            let claimed = messages::update_status_if(
                &self.db,
                candidate,
                MessageStatus::Queued,
                MessageStatus::Processing,
            )
            .await?;
            if claimed == 1 {
                let msg = messages::get(&self.db, candidate).await?.ok_or_else(|| {
                    SmsiftError::Internal(format!("claimed message {candidate} vanished"))
                })?;
                debug!(message_id = msg.id, "message claimed");
                return Ok(Some(msg));
            }
            // Another worker won this candidate; pick the next-oldest.
        }
    }

    /// Histogram of runtime messages by status.
    pub async fn counts(&self) -> Result<HashMap<MessageStatus, i64>, SmsiftError> {
        messages::counts(&self.db).await
    }
}
