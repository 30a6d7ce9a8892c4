// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget event observer trait.

use crate::types::{RetrainOutcome, ScoreOutcome};

/// Receives result records from the scoring and retrain runners.
///
/// Delivery is fire-and-forget: observers must not block and cannot fail
/// the emitting runner. No ordering is guaranteed across event kinds.
pub trait EventObserver: Send + Sync {
    /// A message was scored and routed.
    fn on_score(&self, outcome: &ScoreOutcome);

    /// A training attempt completed (successfully or not).
    fn on_retrain(&self, outcome: &RetrainOutcome);
}

/// Observer that drops every event. Useful for tests and one-shot CLI paths.
#[derive(Debug, Default)]
pub struct NullObserver;

impl EventObserver for NullObserver {
    fn on_score(&self, _outcome: &ScoreOutcome) {}
    fn on_retrain(&self, _outcome: &RetrainOutcome) {}
}
