// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsift train` command implementation.
//!
//! Operator-initiated training: bypasses the gold counter and shares the
//! serialized training path with the background retrain loop.

use std::path::PathBuf;
use std::sync::Arc;

use smsift_agent::TrainingService;
use smsift_classifier::BayesClassifier;
use smsift_config::model::SmsiftConfig;
use smsift_core::types::TrainTemplate;
use smsift_core::SmsiftError;
use tokio_util::sync::CancellationToken;

use crate::serve::open_store;

/// Run the `smsift train` command.
pub async fn run_train(
    config: &SmsiftConfig,
    template: &str,
    activate: bool,
) -> Result<(), SmsiftError> {
    let template: TrainTemplate = template.parse().map_err(|_| {
        SmsiftError::Config(format!(
            "template must be light, medium, or full, got {template}"
        ))
    })?;

    let db = open_store(config).await?;
    let training = TrainingService::new(
        db.clone(),
        Arc::new(BayesClassifier::new()),
        PathBuf::from(&config.models.directory),
    );

    let cancel = CancellationToken::new();
    let report = training.train_model(template, activate, &cancel).await?;
    db.close().await?;

    println!(
        "trained model v{} ({} template): {} samples ({} gold), validated on {}",
        report.version,
        report.template,
        report.train_set_size,
        report.gold_included_count,
        report.validation_set_size
    );
    println!(
        "accuracy {:.4}  precision {:.4}  recall {:.4}  f1 {:.4}",
        report.metrics.accuracy,
        report.metrics.precision,
        report.metrics.recall,
        report.metrics.f1
    );
    println!(
        "{}",
        if report.activated {
            "activated: subsequent scoring uses this version"
        } else {
            "not activated: run with activation or activate explicitly"
        }
    );
    Ok(())
}
