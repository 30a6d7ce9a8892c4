// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default event sink: structured log lines per runner result.

use smsift_core::types::{RetrainOutcome, ScoreOutcome};
use smsift_core::EventObserver;
use tracing::{info, warn};

/// Observer that renders every result record as a tracing event.
#[derive(Debug, Default)]
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn on_score(&self, outcome: &ScoreOutcome) {
        info!(
            message_id = outcome.message_id,
            p_spam = outcome.p_spam,
            decision = %outcome.decision,
            status = %outcome.new_status,
            is_correct = ?outcome.is_correct,
            "scored"
        );
    }

    fn on_retrain(&self, outcome: &RetrainOutcome) {
        if outcome.success {
            info!(
                new_version = ?outcome.new_version,
                template = %outcome.template,
                activated = outcome.activated,
                accuracy = outcome.metrics.as_ref().map(|m| m.accuracy),
                f1 = outcome.metrics.as_ref().map(|m| m.f1),
                reason = outcome.reason.as_str(),
                "retrained"
            );
        } else {
            warn!(
                template = %outcome.template,
                reason = outcome.reason.as_str(),
                "retrain attempt failed"
            );
        }
    }
}
