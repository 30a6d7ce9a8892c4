// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review service: moderator verdicts and the auto-retrain check.

use smsift_core::types::{Label, Review};
use smsift_core::SmsiftError;
use smsift_storage::queries::{reviews, settings};
use smsift_storage::Database;
use tracing::info;

/// Result of [`ReviewService::check_auto_retrain`].
#[derive(Debug, Clone, Copy)]
pub struct AutoRetrainCheck {
    pub should_trigger: bool,
    pub current: i64,
    pub threshold: i64,
}

/// Service wrapper over moderator verdicts.
#[derive(Clone)]
pub struct ReviewService {
    db: Database,
}

impl ReviewService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a verdict: writes the review, moves the message to its
    /// terminal state, and increments the gold counter, atomically.
    ///
    /// A second verdict for the same message fails with `Conflict`.
    pub async fn add_review(
        &self,
        message_id: i64,
        label: Label,
        reviewed_by: &str,
        note: Option<&str>,
    ) -> Result<Review, SmsiftError> {
        let review = reviews::add_review(&self.db, message_id, label, reviewed_by, note).await?;
        info!(
            message_id,
            label = %label,
            reviewed_by,
            "gold label recorded"
        );
        Ok(review)
    }

    /// Whether the accumulated gold labels warrant a retrain right now.
    ///
    /// The caller decides between triggering training directly and letting
    /// the background retrain loop pick it up on its next tick; both paths
    /// converge on the same serialized training service.
    pub async fn check_auto_retrain(&self) -> Result<AutoRetrainCheck, SmsiftError> {
        let s = settings::get(&self.db).await?;
        let should_trigger = s.auto_retrain_enabled
            && s.retrain_gold_threshold > 0
            && s.new_gold_since_last_train >= s.retrain_gold_threshold;
        Ok(AutoRetrainCheck {
            should_trigger,
            current: s.new_gold_since_last_train,
            threshold: s.retrain_gold_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsift_storage::queries::messages;
    use smsift_storage::SettingsSeed;
    use tempfile::tempdir;

    async fn setup(threshold: i64, enabled: bool) -> (ReviewService, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("review.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        settings::ensure_seeded(
            &db,
            &SettingsSeed {
                retrain_gold_threshold: threshold,
                auto_retrain_enabled: enabled,
                ..SettingsSeed::default()
            },
        )
        .await
        .unwrap();
        (ReviewService::new(db.clone()), db, dir)
    }

    #[tokio::test]
    async fn reviews_accumulate_toward_the_threshold() {
        let (service, db, _dir) = setup(2, true).await;

        let check = service.check_auto_retrain().await.unwrap();
        assert!(!check.should_trigger);
        assert_eq!(check.current, 0);
        assert_eq!(check.threshold, 2);

        let m1 = messages::insert_runtime(&db, "one").await.unwrap();
        service.add_review(m1.id, Label::Ham, "mod", None).await.unwrap();
        assert!(!service.check_auto_retrain().await.unwrap().should_trigger);

        let m2 = messages::insert_runtime(&db, "two").await.unwrap();
        service.add_review(m2.id, Label::Spam, "mod", None).await.unwrap();
        let check = service.check_auto_retrain().await.unwrap();
        assert!(check.should_trigger);
        assert_eq!(check.current, 2);
    }

    #[tokio::test]
    async fn disabled_auto_retrain_never_triggers() {
        let (service, db, _dir) = setup(1, false).await;
        let m = messages::insert_runtime(&db, "msg").await.unwrap();
        service.add_review(m.id, Label::Spam, "mod", None).await.unwrap();
        assert!(!service.check_auto_retrain().await.unwrap().should_trigger);
    }

    #[tokio::test]
    async fn zero_threshold_never_triggers() {
        let (service, db, _dir) = setup(0, true).await;
        let m = messages::insert_runtime(&db, "msg").await.unwrap();
        service.add_review(m.id, Label::Spam, "mod", None).await.unwrap();
        assert!(!service.check_auto_retrain().await.unwrap().should_trigger);
    }
}
