// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training service: assemble sets, train, evaluate, persist, activate.
//!
//! Trainings are serialized by an internal mutex. The review-path trigger
//! and the background retrain loop share one `TrainingService`, so two
//! near-simultaneous counter crossings produce sequential version numbers
//! and the later activation wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use smsift_core::types::{EvalMetrics, ModelVersion, TrainTemplate};
use smsift_core::{ClassifierAdapter, SmsiftError};
use smsift_storage::queries::{messages, model_versions, reviews, settings};
use smsift_storage::Database;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of one completed training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub version: i64,
    pub template: TrainTemplate,
    pub train_set_size: usize,
    pub gold_included_count: usize,
    pub validation_set_size: usize,
    pub metrics: EvalMetrics,
    pub activated: bool,
    pub artifact_path: String,
}

/// Service that produces and activates model versions.
pub struct TrainingService {
    db: Database,
    classifier: Arc<dyn ClassifierAdapter>,
    models_dir: PathBuf,
    train_lock: Mutex<()>,
}

impl TrainingService {
    pub fn new(db: Database, classifier: Arc<dyn ClassifierAdapter>, models_dir: PathBuf) -> Self {
        Self {
            db,
            classifier,
            models_dir,
            train_lock: Mutex::new(()),
        }
    }

    /// Train a new model version and optionally activate it.
    ///
    /// The training set is the capped train pool concatenated with every
    /// gold-labeled row; the validation set is the frozen holdout. On
    /// success the gold counter is reset; on failure the prior active
    /// version and the counter are untouched. Cancellation is observed
    /// between steps and completes with `Cancelled`.
    pub async fn train_model(
        &self,
        template: TrainTemplate,
        activate: bool,
        cancel: &CancellationToken,
    ) -> Result<TrainReport, SmsiftError> {
        let _serialized = self.train_lock.lock().await;
        ensure_not_cancelled(cancel)?;

        let pool = messages::train_pool_samples(&self.db, template.size_cap()).await?;
        let gold = reviews::gold_samples(&self.db).await?;
        let gold_included_count = gold.len();
        let mut training_set = pool;
        training_set.extend(gold);
        if training_set.is_empty() {
            return Err(SmsiftError::InvalidState(
                "training set is empty: import the dataset or accumulate reviews first".to_string(),
            ));
        }

        let validation = messages::validation_samples(&self.db).await?;
        ensure_not_cancelled(cancel)?;

        let version = model_versions::next_version(&self.db).await?;
        let artifact_path = self.models_dir.join(format!("model_v{version}.json"));

        info!(
            version,
            template = %template,
            train_set_size = training_set.len(),
            gold_included_count,
            validation_set_size = validation.len(),
            "training started"
        );

        let artifact = self
            .classifier
            .train(&training_set, &artifact_path)
            .await
            .map_err(into_training_failure)?;
        ensure_not_cancelled(cancel)?;

        let metrics = self
            .classifier
            .evaluate(&validation)
            .await
            .map_err(into_training_failure)?;
        ensure_not_cancelled(cancel)?;

        let s = settings::get(&self.db).await?;
        let record = ModelVersion {
            version,
            train_template: template,
            train_set_size: training_set.len() as i64,
            gold_included_count: gold_included_count as i64,
            validation_set_size: validation.len() as i64,
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            f1: metrics.f1,
            threshold_allow: s.threshold_allow,
            threshold_block: s.threshold_block,
            artifact_path: artifact.display().to_string(),
            created_at: String::new(),
            is_active: false,
        };
        model_versions::insert(&self.db, &record).await?;

        if activate {
            self.activate_model(version).await?;
        }

        settings::mark_retrained(&self.db).await?;

        info!(
            version,
            accuracy = metrics.accuracy,
            f1 = metrics.f1,
            activated = activate,
            "training completed"
        );

        Ok(TrainReport {
            version,
            template,
            train_set_size: record.train_set_size as usize,
            gold_included_count,
            validation_set_size: record.validation_set_size as usize,
            metrics,
            activated: activate,
            artifact_path: record.artifact_path,
        })
    }

    /// Flip the active pointer to `version` and load its artifact.
    ///
    /// The flag flip and the settings back-reference commit in one store
    /// transaction; the classifier load happens after it, guarded by the
    /// classifier's own lock so scorers never observe a half-loaded model.
    /// If the load fails the version stays persisted and activatable.
    pub async fn activate_model(&self, version: i64) -> Result<(), SmsiftError> {
        let flipped = model_versions::activate(&self.db, version).await?;
        self.classifier
            .load(Path::new(&flipped.artifact_path))
            .await?;
        info!(version, "model version activated");
        Ok(())
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), SmsiftError> {
    if cancel.is_cancelled() {
        return Err(SmsiftError::Cancelled);
    }
    Ok(())
}

fn into_training_failure(e: SmsiftError) -> SmsiftError {
    match e {
        SmsiftError::Cancelled => SmsiftError::Cancelled,
        other => SmsiftError::TrainingFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsift_classifier::KeywordClassifier;
    use smsift_core::types::{DatasetSplit, Label};
    use smsift_storage::SettingsSeed;
    use tempfile::tempdir;

    async fn setup() -> (TrainingService, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("training.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        settings::ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();
        let classifier = Arc::new(KeywordClassifier::new());
        let service = TrainingService::new(
            db.clone(),
            classifier,
            dir.path().join("models"),
        );
        (service, db, dir)
    }

    async fn seed_dataset(db: &Database, pool: usize, holdout: usize) {
        let mut rows = Vec::new();
        for i in 0..pool {
            rows.push((
                format!("pool sample {i} free prize"),
                if i % 2 == 0 { Label::Spam } else { Label::Ham },
                DatasetSplit::TrainPool,
            ));
        }
        for i in 0..holdout {
            rows.push((
                format!("holdout sample {i}"),
                Label::Ham,
                DatasetSplit::ValidationHoldout,
            ));
        }
        messages::insert_dataset_batch(db, rows).await.unwrap();
    }

    #[tokio::test]
    async fn empty_training_set_is_invalid_state() {
        let (service, _db, _dir) = setup().await;
        let cancel = CancellationToken::new();
        let err = service
            .train_model(TrainTemplate::Light, false, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SmsiftError::InvalidState(_)));
    }

    #[tokio::test]
    async fn training_persists_version_and_resets_counter() {
        let (service, db, _dir) = setup().await;
        seed_dataset(&db, 6, 3).await;

        // Accrue one gold label so the counter has something to reset.
        let m = messages::insert_runtime(&db, "reviewed free prize").await.unwrap();
        reviews::add_review(&db, m.id, Label::Spam, "mod", None).await.unwrap();
        assert_eq!(settings::get(&db).await.unwrap().new_gold_since_last_train, 1);

        let cancel = CancellationToken::new();
        let report = service
            .train_model(TrainTemplate::Light, true, &cancel)
            .await
            .unwrap();

        assert_eq!(report.version, 1);
        assert_eq!(report.train_set_size, 7, "pool plus gold");
        assert_eq!(report.gold_included_count, 1);
        assert_eq!(report.validation_set_size, 3);
        assert!(report.activated);

        let persisted = model_versions::get(&db, 1).await.unwrap().unwrap();
        assert!(persisted.is_active);
        assert_eq!(persisted.gold_included_count, 1);
        assert_eq!(persisted.threshold_allow, 0.30);

        let s = settings::get(&db).await.unwrap();
        assert_eq!(s.active_model_version, Some(1));
        assert_eq!(s.new_gold_since_last_train, 0);
        assert!(s.last_retrain_at.is_some());
    }

    #[tokio::test]
    async fn unactivated_training_leaves_active_pointer_alone() {
        let (service, db, _dir) = setup().await;
        seed_dataset(&db, 4, 2).await;
        let cancel = CancellationToken::new();

        service.train_model(TrainTemplate::Light, true, &cancel).await.unwrap();
        service.train_model(TrainTemplate::Medium, false, &cancel).await.unwrap();

        let s = settings::get(&db).await.unwrap();
        assert_eq!(s.active_model_version, Some(1));
        let v2 = model_versions::get(&db, 2).await.unwrap().unwrap();
        assert!(!v2.is_active);

        // Recoverable via explicit activation.
        service.activate_model(2).await.unwrap();
        assert_eq!(
            settings::get(&db).await.unwrap().active_model_version,
            Some(2)
        );
    }

    #[tokio::test]
    async fn template_caps_the_train_pool() {
        let (service, db, _dir) = setup().await;
        seed_dataset(&db, 600, 10).await;
        let cancel = CancellationToken::new();

        let light = service
            .train_model(TrainTemplate::Light, false, &cancel)
            .await
            .unwrap();
        assert_eq!(light.train_set_size, 500);

        let full = service
            .train_model(TrainTemplate::Full, false, &cancel)
            .await
            .unwrap();
        assert_eq!(full.train_set_size, 600);
        assert_eq!(full.version, 2);
    }

    #[tokio::test]
    async fn holdout_is_stable_across_trainings() {
        let (service, db, _dir) = setup().await;
        seed_dataset(&db, 20, 7).await;
        let cancel = CancellationToken::new();

        let ids_before = messages::validation_holdout_ids(&db).await.unwrap();
        let first = service
            .train_model(TrainTemplate::Medium, true, &cancel)
            .await
            .unwrap();
        let second = service
            .train_model(TrainTemplate::Light, true, &cancel)
            .await
            .unwrap();
        let ids_after = messages::validation_holdout_ids(&db).await.unwrap();

        assert_eq!(first.validation_set_size, 7);
        assert_eq!(second.validation_set_size, 7);
        assert_eq!(ids_before, ids_after);
    }

    #[tokio::test]
    async fn cancelled_training_makes_no_writes() {
        let (service, db, _dir) = setup().await;
        seed_dataset(&db, 4, 2).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = service
            .train_model(TrainTemplate::Light, true, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SmsiftError::Cancelled));
        assert!(model_versions::active(&db).await.unwrap().is_none());
    }
}
