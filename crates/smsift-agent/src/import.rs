// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot dataset import.
//!
//! Each line is `<label>\t<text>` with a case-insensitive `ham`/`spam`
//! label. The import shuffles with a fixed seed and partitions 80% into
//! the train pool and 20% into the frozen validation holdout, so the same
//! dataset bytes always produce the identical partition.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use smsift_core::types::{DatasetSplit, Label};
use smsift_core::SmsiftError;
use smsift_storage::queries::messages;
use smsift_storage::Database;
use tracing::{info, warn};

/// Fixed shuffle seed. Changing it changes every train/holdout split.
const IMPORT_SHUFFLE_SEED: u64 = 42;

/// Outcome of an import attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows created by this import.
    pub imported: usize,
    /// How many of them landed in the train pool.
    pub train_pool: usize,
    /// How many of them landed in the validation holdout.
    pub holdout: usize,
    /// Pre-existing dataset rows that made this import a no-op.
    pub skipped: usize,
}

/// Import the dataset file at `path`.
///
/// A repeat import is a no-op reporting `skipped > 0` unless `force` is
/// set, in which case all dataset rows are deleted and re-created.
pub async fn import_dataset(
    db: &Database,
    path: &Path,
    force: bool,
) -> Result<ImportReport, SmsiftError> {
    let existing = messages::dataset_count(db).await?;
    if existing > 0 && !force {
        info!(existing, "dataset already imported, skipping");
        return Ok(ImportReport {
            imported: 0,
            train_pool: 0,
            holdout: 0,
            skipped: existing as usize,
        });
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SmsiftError::NotFound(format!(
                "dataset file {}",
                path.display()
            )));
        }
        Err(source) => return Err(SmsiftError::Io { source }),
    };

    let mut records = parse_dataset(&content);
    if records.is_empty() {
        return Err(SmsiftError::InvalidInput(format!(
            "dataset file {} contains no records",
            path.display()
        )));
    }

    let mut rng = StdRng::seed_from_u64(IMPORT_SHUFFLE_SEED);
    records.shuffle(&mut rng);

    let train_pool = records.len() * 4 / 5;
    let holdout = records.len() - train_pool;
    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, (text, label))| {
            let split = if i < train_pool {
                DatasetSplit::TrainPool
            } else {
                DatasetSplit::ValidationHoldout
            };
            (text, label, split)
        })
        .collect::<Vec<_>>();

    if force && existing > 0 {
        let deleted = messages::delete_dataset_rows(db).await?;
        info!(deleted, "forced re-import: dataset rows deleted");
    }

    let imported = messages::insert_dataset_batch(db, rows).await?;
    info!(imported, train_pool, holdout, "dataset imported");

    Ok(ImportReport {
        imported,
        train_pool,
        holdout,
        skipped: 0,
    })
}

/// Parse `<label>\t<text>` lines. Empty and malformed lines are skipped.
fn parse_dataset(content: &str) -> Vec<(String, Label)> {
    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((label, text)) = line.split_once('\t') else {
            warn!(lineno = lineno + 1, "skipping line without a tab separator");
            continue;
        };
        let label = match label.trim().to_lowercase().as_str() {
            "ham" => Label::Ham,
            "spam" => Label::Spam,
            other => {
                warn!(lineno = lineno + 1, label = other, "skipping unknown label");
                continue;
            }
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        records.push((text.to_string(), label));
    }
    records
}
