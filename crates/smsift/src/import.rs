// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsift import` command implementation.

use std::path::Path;

use smsift_agent::import_dataset;
use smsift_config::model::SmsiftConfig;
use smsift_core::SmsiftError;

use crate::serve::open_store;

/// Run the `smsift import` command.
pub async fn run_import(config: &SmsiftConfig, force: bool) -> Result<(), SmsiftError> {
    let db = open_store(config).await?;
    let report = import_dataset(&db, Path::new(&config.dataset.path), force).await?;
    db.close().await?;

    if report.skipped > 0 {
        println!(
            "dataset already imported ({} rows); use --force to re-import",
            report.skipped
        );
    } else {
        println!(
            "imported {} messages: {} train pool, {} validation holdout",
            report.imported, report.train_pool, report.holdout
        );
    }
    Ok(())
}
