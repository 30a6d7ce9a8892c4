// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring service: one claimed message in, one routed message out.
//!
//! The three-zone decision policy: strictly below the allow threshold the
//! message goes to the inbox, at or above the block threshold it goes to
//! spam, and the band in between is deferred to a moderator.

use std::path::Path;
use std::sync::Arc;

use smsift_core::types::{Decision, Label, MessageStatus, ScoreOutcome, SmsMessage};
use smsift_core::{ClassifierAdapter, SmsiftError};
use smsift_storage::queries::{model_versions, predictions, settings};
use smsift_storage::Database;
use tracing::debug;

/// Service that scores a single claimed message end to end.
#[derive(Clone)]
pub struct ScoringService {
    db: Database,
    classifier: Arc<dyn ClassifierAdapter>,
}

impl ScoringService {
    pub fn new(db: Database, classifier: Arc<dyn ClassifierAdapter>) -> Self {
        Self { db, classifier }
    }

    /// Whether an active model exists. Runners check this before claiming
    /// so no message is pulled into `Processing` just to fail `NotReady`.
    pub async fn is_ready(&self) -> Result<bool, SmsiftError> {
        Ok(settings::get(&self.db).await?.active_model_version.is_some())
    }

    /// Score one message already claimed into `Processing`.
    ///
    /// Persists the prediction and the routing update in one transaction
    /// and returns the result record for the observer.
    pub async fn score_message(&self, message: &SmsMessage) -> Result<ScoreOutcome, SmsiftError> {
        if message.status != MessageStatus::Processing {
            return Err(SmsiftError::InvalidState(format!(
                "message {} is {}, expected processing",
                message.id, message.status
            )));
        }

        let s = settings::get(&self.db).await?;
        let active = s.active_model_version.ok_or(SmsiftError::NotReady)?;

        // Idempotent load: a scorer starting against an existing active
        // version primes the classifier once. In-process activations keep
        // the loaded model in step afterwards.
        if !self.classifier.is_loaded().await {
            let version = model_versions::get(&self.db, active)
                .await?
                .ok_or_else(|| SmsiftError::NotFound(format!("model version {active}")))?;
            self.classifier.load(Path::new(&version.artifact_path)).await?;
        }

        let p_spam = self.classifier.predict(&message.text).await?;
        let (decision, new_status) = decide(p_spam, s.threshold_allow, s.threshold_block);

        predictions::record_scoring(&self.db, message.id, active, p_spam, decision, new_status)
            .await?;

        debug!(
            message_id = message.id,
            model_version = active,
            p_spam,
            decision = %decision,
            "message scored"
        );

        Ok(ScoreOutcome {
            message_id: message.id,
            text: message.text.clone(),
            p_spam,
            decision,
            new_status,
            true_label: message.true_label,
            is_correct: correctness(message.true_label, decision),
        })
    }
}

/// The three-zone policy. Strict `<` on allow, non-strict `>=` on block;
/// with equal thresholds the review zone is empty.
pub fn decide(p_spam: f64, threshold_allow: f64, threshold_block: f64) -> (Decision, MessageStatus) {
    if p_spam < threshold_allow {
        (Decision::Allow, MessageStatus::InInbox)
    } else if p_spam >= threshold_block {
        (Decision::Block, MessageStatus::InSpam)
    } else {
        (Decision::PendingReview, MessageStatus::PendingReview)
    }
}

/// Whether the decision matched the known label. Unknowable when the
/// decision was deferred or the message carries no label.
fn correctness(true_label: Option<Label>, decision: Decision) -> Option<bool> {
    match (true_label, decision) {
        (_, Decision::PendingReview) => None,
        (None, _) => None,
        (Some(Label::Ham), Decision::Allow) => Some(true),
        (Some(Label::Spam), Decision::Block) => Some(true),
        (Some(_), _) => Some(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueService;
    use smsift_classifier::KeywordClassifier;
    use smsift_storage::queries::messages;
    use smsift_storage::SettingsSeed;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn decision_zones_and_boundaries() {
        let (allow, block) = (0.3, 0.7);
        assert_eq!(decide(0.0, allow, block).0, Decision::Allow);
        assert_eq!(decide(0.29999, allow, block).0, Decision::Allow);
        // Exactly at the allow threshold: strict `<` fails, defer.
        assert_eq!(decide(0.3, allow, block).0, Decision::PendingReview);
        assert_eq!(decide(0.5, allow, block).0, Decision::PendingReview);
        // Exactly at the block threshold: non-strict `>=` blocks.
        assert_eq!(decide(0.7, allow, block).0, Decision::Block);
        assert_eq!(decide(1.0, allow, block).0, Decision::Block);
    }

    #[test]
    fn equal_thresholds_leave_no_review_zone() {
        assert_eq!(decide(0.49, 0.5, 0.5).0, Decision::Allow);
        assert_eq!(decide(0.5, 0.5, 0.5).0, Decision::Block);
    }

    #[test]
    fn correctness_matrix() {
        assert_eq!(correctness(Some(Label::Ham), Decision::Allow), Some(true));
        assert_eq!(correctness(Some(Label::Spam), Decision::Block), Some(true));
        assert_eq!(correctness(Some(Label::Ham), Decision::Block), Some(false));
        assert_eq!(correctness(Some(Label::Spam), Decision::Allow), Some(false));
        assert_eq!(correctness(Some(Label::Spam), Decision::PendingReview), None);
        assert_eq!(correctness(None, Decision::Allow), None);
    }

    async fn setup() -> (ScoringService, QueueService, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scoring.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        settings::ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();
        let classifier = Arc::new(KeywordClassifier::preloaded());
        (
            ScoringService::new(db.clone(), classifier),
            QueueService::new(db.clone()),
            db,
            dir,
        )
    }

    #[tokio::test]
    async fn scoring_without_active_model_is_not_ready() {
        let (scoring, queue, _db, _dir) = setup().await;
        assert!(!scoring.is_ready().await.unwrap());

        queue.enqueue("WIN FREE IPHONE NOW!!!").await.unwrap();
        let cancel = CancellationToken::new();
        let msg = queue.claim_next(&cancel).await.unwrap().unwrap();

        let err = scoring.score_message(&msg).await.unwrap_err();
        assert!(matches!(err, SmsiftError::NotReady));
    }

    #[tokio::test]
    async fn scoring_an_unclaimed_message_is_invalid() {
        let (scoring, queue, _db, _dir) = setup().await;
        let msg = queue.enqueue("still queued").await.unwrap();
        let err = scoring.score_message(&msg).await.unwrap_err();
        assert!(matches!(err, SmsiftError::InvalidState(_)));
    }

    #[tokio::test]
    async fn scored_message_gets_prediction_and_route() {
        let (scoring, queue, db, _dir) = setup().await;
        model_versions::insert(&db, &test_version(1)).await.unwrap();
        model_versions::activate(&db, 1).await.unwrap();

        queue.enqueue("WIN FREE IPHONE NOW!!!").await.unwrap();
        let cancel = CancellationToken::new();
        let msg = queue.claim_next(&cancel).await.unwrap().unwrap();

        let outcome = scoring.score_message(&msg).await.unwrap();
        assert_eq!(outcome.decision, Decision::Block);
        assert_eq!(outcome.new_status, MessageStatus::InSpam);
        assert!(outcome.p_spam >= 0.7);
        assert_eq!(outcome.is_correct, None, "no label on a runtime message");

        let row = messages::get(&db, msg.id).await.unwrap().unwrap();
        assert_eq!(row.status, MessageStatus::InSpam);
        assert_eq!(row.last_model_version, Some(1));

        let history = predictions::for_message(&db, msg.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].model_version, 1);
    }

    #[tokio::test]
    async fn labeled_message_reports_correctness() {
        let (scoring, queue, db, _dir) = setup().await;
        model_versions::insert(&db, &test_version(1)).await.unwrap();
        model_versions::activate(&db, 1).await.unwrap();

        // Simulator-style feed: holdout copy carrying its true label.
        messages::insert_dataset_batch(
            &db,
            vec![(
                "free prize cash".to_string(),
                Label::Spam,
                smsift_core::types::DatasetSplit::ValidationHoldout,
            )],
        )
        .await
        .unwrap();
        queue.enqueue_from_validation(1, true).await.unwrap();

        let cancel = CancellationToken::new();
        let msg = queue.claim_next(&cancel).await.unwrap().unwrap();
        let outcome = scoring.score_message(&msg).await.unwrap();
        assert_eq!(outcome.true_label, Some(Label::Spam));
        assert_eq!(outcome.is_correct, Some(true));
    }

    fn test_version(version: i64) -> smsift_core::types::ModelVersion {
        smsift_core::types::ModelVersion {
            version,
            train_template: smsift_core::types::TrainTemplate::Light,
            train_set_size: 10,
            gold_included_count: 0,
            validation_set_size: 4,
            accuracy: 1.0,
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            threshold_allow: 0.3,
            threshold_block: 0.7,
            artifact_path: "models/model_v1.json".to_string(),
            created_at: String::new(),
            is_active: false,
        }
    }
}
