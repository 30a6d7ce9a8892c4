// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsift status` command implementation.
//!
//! Reads the store directly: queue histogram, active model version with
//! its holdout metrics, and the retrain counter state.

use smsift_config::model::SmsiftConfig;
use smsift_core::types::MessageStatus;
use smsift_core::SmsiftError;
use smsift_storage::queries::{messages, model_versions, settings};

use crate::serve::open_store;

/// Run the `smsift status` command.
pub async fn run_status(config: &SmsiftConfig) -> Result<(), SmsiftError> {
    let db = open_store(config).await?;

    let counts = messages::counts(&db).await?;
    let s = settings::get(&db).await?;
    let active = model_versions::active(&db).await?;
    let versions = model_versions::list(&db).await?;

    println!("queue (runtime messages by status):");
    for status in [
        MessageStatus::Queued,
        MessageStatus::Processing,
        MessageStatus::PendingReview,
        MessageStatus::InInbox,
        MessageStatus::InSpam,
    ] {
        let n = counts.get(&status).copied().unwrap_or(0);
        println!("  {status:<16} {n}");
    }

    match active {
        Some(v) => {
            println!(
                "active model: v{} ({} template, trained on {} samples, {} gold)",
                v.version, v.train_template, v.train_set_size, v.gold_included_count
            );
            println!(
                "  accuracy {:.4}  precision {:.4}  recall {:.4}  f1 {:.4}",
                v.accuracy, v.precision, v.recall, v.f1
            );
        }
        None => println!("active model: none (scoring is not ready)"),
    }
    println!("model versions persisted: {}", versions.len());

    println!(
        "thresholds: allow < {:.2}, block >= {:.2}",
        s.threshold_allow, s.threshold_block
    );
    println!(
        "retrain: {} gold since last train (threshold {}, auto {})",
        s.new_gold_since_last_train,
        s.retrain_gold_threshold,
        if s.auto_retrain_enabled { "on" } else { "off" }
    );
    if let Some(at) = &s.last_retrain_at {
        println!("last retrain: {at}");
    }

    db.close().await?;
    Ok(())
}
