// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrain agent runner: a periodic counter-check -> train -> activate loop.
//!
//! Each tick reads a fresh settings snapshot and decides. The gold counter
//! is reset by the training service on success only; a failed attempt
//! leaves it intact so the next tick retries after the error backoff.

use std::sync::Arc;
use std::time::Duration;

use smsift_config::model::RetrainConfig;
use smsift_core::types::{RetrainOutcome, TrainTemplate};
use smsift_core::{EventObserver, SmsiftError};
use smsift_storage::queries::settings;
use smsift_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::training::TrainingService;

/// Long-running retrain worker.
pub struct RetrainRunner {
    db: Database,
    training: Arc<TrainingService>,
    observer: Arc<dyn EventObserver>,
    config: RetrainConfig,
    template: TrainTemplate,
}

impl RetrainRunner {
    pub fn new(
        db: Database,
        training: Arc<TrainingService>,
        observer: Arc<dyn EventObserver>,
        config: RetrainConfig,
        template: TrainTemplate,
    ) -> Self {
        Self {
            db,
            training,
            observer,
            config,
            template,
        }
    }

    /// Run until cancelled, checking the counter every `check_interval_ms`.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(template = %self.template, "retrain worker started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let delay = match self.tick(&cancel).await {
                Ok(Some(outcome)) if !outcome.success => {
                    Duration::from_millis(self.config.error_backoff_ms)
                }
                Ok(_) => Duration::from_millis(self.config.check_interval_ms),
                Err(SmsiftError::Cancelled) => break,
                Err(e) => {
                    warn!(error = %e, "retrain tick failed");
                    Duration::from_millis(self.config.error_backoff_ms)
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("retrain worker stopped");
    }

    /// One decision cycle. Returns `None` when the counter has not crossed
    /// the threshold (or the trigger is disabled), otherwise the outcome
    /// of the training attempt.
    pub async fn tick(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<RetrainOutcome>, SmsiftError> {
        let s = settings::get(&self.db).await?;
        if !s.auto_retrain_enabled
            || s.retrain_gold_threshold <= 0
            || s.new_gold_since_last_train < s.retrain_gold_threshold
        {
            return Ok(None);
        }

        info!(
            gold = s.new_gold_since_last_train,
            threshold = s.retrain_gold_threshold,
            "gold threshold crossed, retraining"
        );

        let reason = format!(
            "gold threshold crossed ({}/{})",
            s.new_gold_since_last_train, s.retrain_gold_threshold
        );
        let outcome = self.attempt(self.template, true, reason, cancel).await?;
        Ok(Some(outcome))
    }

    /// Operator-initiated retrain: bypasses the counter check entirely and
    /// shares the same serialized training path.
    pub async fn force_retrain(
        &self,
        template: TrainTemplate,
        activate: bool,
        cancel: &CancellationToken,
    ) -> Result<RetrainOutcome, SmsiftError> {
        self.attempt(template, activate, "forced by operator".to_string(), cancel)
            .await
    }

    async fn attempt(
        &self,
        template: TrainTemplate,
        activate: bool,
        reason: String,
        cancel: &CancellationToken,
    ) -> Result<RetrainOutcome, SmsiftError> {
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.6fZ")
            .to_string();

        let outcome = match self.training.train_model(template, activate, cancel).await {
            Ok(report) => RetrainOutcome {
                success: true,
                new_version: Some(report.version),
                metrics: Some(report.metrics),
                template,
                activated: report.activated,
                reason,
                timestamp,
            },
            Err(SmsiftError::Cancelled) => return Err(SmsiftError::Cancelled),
            Err(e) => RetrainOutcome {
                success: false,
                new_version: None,
                metrics: None,
                template,
                activated: false,
                reason: e.to_string(),
                timestamp,
            },
        };

        self.observer.on_retrain(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsift_classifier::KeywordClassifier;
    use smsift_core::types::{DatasetSplit, Label};
    use smsift_storage::queries::{messages, model_versions, reviews};
    use smsift_storage::SettingsSeed;
    use tempfile::tempdir;

    fn fast_config() -> RetrainConfig {
        RetrainConfig {
            check_interval_ms: 5,
            error_backoff_ms: 5,
            default_template: "light".to_string(),
        }
    }

    async fn setup(threshold: i64) -> (RetrainRunner, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("retrain.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        settings::ensure_seeded(
            &db,
            &SettingsSeed {
                retrain_gold_threshold: threshold,
                ..SettingsSeed::default()
            },
        )
        .await
        .unwrap();

        let classifier = Arc::new(KeywordClassifier::new());
        let training = Arc::new(TrainingService::new(
            db.clone(),
            classifier,
            dir.path().join("models"),
        ));
        let runner = RetrainRunner::new(
            db.clone(),
            training,
            Arc::new(smsift_core::NullObserver),
            fast_config(),
            TrainTemplate::Light,
        );
        (runner, db, dir)
    }

    async fn seed_reviews(db: &Database, n: usize) {
        for i in 0..n {
            let m = messages::insert_runtime(db, &format!("reviewed {i} free prize"))
                .await
                .unwrap();
            reviews::add_review(db, m.id, Label::Spam, "mod", None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn tick_skips_below_threshold() {
        let (runner, db, _dir) = setup(3).await;
        seed_reviews(&db, 2).await;

        let cancel = CancellationToken::new();
        assert!(runner.tick(&cancel).await.unwrap().is_none());
        assert!(model_versions::active(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tick_trains_and_activates_at_threshold() {
        let (runner, db, _dir) = setup(3).await;
        seed_reviews(&db, 3).await;

        let cancel = CancellationToken::new();
        let outcome = runner.tick(&cancel).await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_version, Some(1));
        assert!(outcome.activated);
        assert!(outcome.metrics.is_some());

        let s = settings::get(&db).await.unwrap();
        assert_eq!(s.active_model_version, Some(1));
        assert_eq!(s.new_gold_since_last_train, 0);

        // Counter is reset: the next tick skips.
        assert!(runner.tick(&cancel).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_training_keeps_the_counter() {
        // Threshold 1 with one review but NO trainable rows at all would
        // still train on the gold row, so force failure with an empty
        // training set by never creating any gold or dataset rows and
        // bypassing the counter via force_retrain.
        let (runner, db, _dir) = setup(1).await;
        let cancel = CancellationToken::new();

        let outcome = runner
            .force_retrain(TrainTemplate::Full, true, &cancel)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.new_version.is_none());
        assert!(outcome.reason.contains("training set is empty"));
        assert!(model_versions::active(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn force_retrain_ignores_the_counter() {
        let (runner, db, _dir) = setup(100).await;
        messages::insert_dataset_batch(
            &db,
            vec![
                ("free prize".to_string(), Label::Spam, DatasetSplit::TrainPool),
                ("see you soon".to_string(), Label::Ham, DatasetSplit::TrainPool),
            ],
        )
        .await
        .unwrap();

        let cancel = CancellationToken::new();
        let outcome = runner
            .force_retrain(TrainTemplate::Full, true, &cancel)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_version, Some(1));
        assert_eq!(
            settings::get(&db).await.unwrap().active_model_version,
            Some(1)
        );
    }

    #[tokio::test]
    async fn loop_exits_on_cancellation() {
        let (runner, _db, _dir) = setup(100).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_millis(100), runner.run(cancel))
            .await
            .expect("cancelled runner must exit promptly");
    }
}
