// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsift serve` command implementation.
//!
//! Opens the store, seeds the singleton settings row, primes the
//! classifier from the persisted active version, and spawns the worker
//! loops: N scoring workers, the retrain loop, and (when enabled) the
//! holdout simulator. Shuts down gracefully on SIGINT/SIGTERM.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use smsift_agent::shutdown;
use smsift_agent::{
    LogObserver, QueueService, RetrainRunner, ScoringRunner, ScoringService, SimulatorRunner,
    TrainingService,
};
use smsift_classifier::BayesClassifier;
use smsift_config::model::SmsiftConfig;
use smsift_core::types::TrainTemplate;
use smsift_core::{ClassifierAdapter, EventObserver, SmsiftError};
use smsift_storage::queries::{model_versions, settings};
use smsift_storage::{Database, SettingsSeed};
use tracing::{info, warn};

/// Run the `smsift serve` command until a shutdown signal arrives.
pub async fn run_serve(config: SmsiftConfig) -> Result<(), SmsiftError> {
    info!(agent = config.agent.name.as_str(), "starting smsift serve");

    let db = open_store(&config).await?;

    let classifier: Arc<dyn ClassifierAdapter> = Arc::new(BayesClassifier::new());
    prime_classifier(&db, classifier.as_ref()).await?;

    let observer: Arc<dyn EventObserver> = Arc::new(LogObserver);
    let training = Arc::new(TrainingService::new(
        db.clone(),
        classifier.clone(),
        PathBuf::from(&config.models.directory),
    ));
    let template: TrainTemplate = config.retrain.default_template.parse().map_err(|_| {
        SmsiftError::Config(format!(
            "retrain.default_template must be light, medium, or full, got {}",
            config.retrain.default_template
        ))
    })?;

    let cancel = shutdown::install_signal_handler();
    let mut workers = Vec::new();

    for worker_id in 0..config.scorer.workers {
        let runner = ScoringRunner::new(
            QueueService::new(db.clone()),
            ScoringService::new(db.clone(), classifier.clone()),
            observer.clone(),
            config.scorer.clone(),
            worker_id,
        );
        let cancel = cancel.clone();
        workers.push(tokio::spawn(async move { runner.run(cancel).await }));
    }

    {
        let runner = RetrainRunner::new(
            db.clone(),
            training.clone(),
            observer.clone(),
            config.retrain.clone(),
            template,
        );
        let cancel = cancel.clone();
        workers.push(tokio::spawn(async move { runner.run(cancel).await }));
    }

    if config.simulator.enabled {
        let runner = SimulatorRunner::new(QueueService::new(db.clone()), config.simulator.clone());
        let cancel = cancel.clone();
        workers.push(tokio::spawn(async move { runner.run(cancel).await }));
    }

    info!(
        scoring_workers = config.scorer.workers,
        simulator = config.simulator.enabled,
        "smsift running"
    );

    cancel.cancelled().await;
    for worker in workers {
        let _ = worker.await;
    }

    db.close().await?;
    info!("smsift stopped");
    Ok(())
}

/// Open the database and seed the singleton settings row from config.
pub async fn open_store(config: &SmsiftConfig) -> Result<Database, SmsiftError> {
    let db = Database::open(&config.storage.database_path).await?;
    settings::ensure_seeded(
        &db,
        &SettingsSeed {
            threshold_allow: config.defaults.threshold_allow,
            threshold_block: config.defaults.threshold_block,
            retrain_gold_threshold: config.defaults.retrain_gold_threshold,
            auto_retrain_enabled: config.defaults.auto_retrain_enabled,
        },
    )
    .await?;
    Ok(db)
}

/// Load the persisted active version's artifact, if there is one.
///
/// A missing or unreadable artifact is logged, not fatal: the scoring
/// loop reports `NotReady` until a training produces a fresh version.
async fn prime_classifier(
    db: &Database,
    classifier: &dyn ClassifierAdapter,
) -> Result<(), SmsiftError> {
    let Some(active) = settings::get(db).await?.active_model_version else {
        info!("no active model version yet");
        return Ok(());
    };

    match model_versions::get(db, active).await? {
        Some(version) => match classifier.load(Path::new(&version.artifact_path)).await {
            Ok(()) => info!(version = active, "active model loaded"),
            Err(e) => warn!(
                version = active,
                error = %e,
                "failed to load active model artifact; scoring will wait for a retrain"
            ),
        },
        None => warn!(
            version = active,
            "settings reference a model version missing from the store"
        ),
    }
    Ok(())
}
