// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message queries: CRUD, queue-partition operations, and the
//! conditional-update primitive that makes queue claims exclusive.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use smsift_core::types::{DatasetSplit, Label, LabeledSample, MessageStatus, SmsMessage};
use smsift_core::SmsiftError;

use crate::database::{map_tr_err, now_iso, Database};
use crate::queries::{parse_enum, parse_enum_opt};

const MESSAGE_COLUMNS: &str =
    "id, text, source, split, true_label, status, created_at, last_model_version";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<SmsMessage> {
    Ok(SmsMessage {
        id: row.get(0)?,
        text: row.get(1)?,
        source: parse_enum(2, row.get(2)?)?,
        split: parse_enum_opt(3, row.get(3)?)?,
        true_label: parse_enum_opt(4, row.get(4)?)?,
        status: parse_enum(5, row.get(5)?)?,
        created_at: row.get(6)?,
        last_model_version: row.get(7)?,
    })
}

/// Insert a runtime message in `Queued` state and return the created row.
pub async fn insert_runtime(db: &Database, text: &str) -> Result<SmsMessage, SmsiftError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            let now = now_iso();
            conn.execute(
                "INSERT INTO messages (text, source, status, created_at)
                 VALUES (?1, 'runtime', 'queued', ?2)",
                params![text, now],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a message by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<SmsMessage>, SmsiftError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Id of the oldest `Queued` message, FIFO by creation time.
pub async fn oldest_queued_id(db: &Database) -> Result<Option<i64>, SmsiftError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT id FROM messages WHERE status = 'queued'
                 ORDER BY created_at ASC, id ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Conditional update: `SET status = new WHERE id = ?1 AND status = expected`.
///
/// Returns the number of rows actually modified (0 or 1). This is the sole
/// primitive behind the exclusive queue claim: only one concurrent caller
/// observes an affected count of 1 for a given transition.
pub async fn update_status_if(
    db: &Database,
    id: i64,
    expected: MessageStatus,
    new: MessageStatus,
) -> Result<usize, SmsiftError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![new.to_string(), id, expected.to_string()],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Copy up to `n` unconsumed validation-holdout originals into the queue.
///
/// Originals are marked `Scored` in the same transaction so they are never
/// picked twice. When every original has been consumed, the pool is reset
/// and the selection retried once. The created rows are returned directly;
/// re-querying by `status = 'queued'` would race with concurrent scorers.
pub async fn enqueue_from_validation(
    db: &Database,
    n: usize,
    copy_label: bool,
) -> Result<Vec<SmsMessage>, SmsiftError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut originals = select_unconsumed_holdout(&tx, n)?;
            if originals.is_empty() {
                tx.execute(
                    "UPDATE messages SET status = 'dataset'
                     WHERE source = 'dataset' AND split = 'validation_holdout'
                       AND status = 'scored'",
                    [],
                )?;
                originals = select_unconsumed_holdout(&tx, n)?;
            }

            let mut created = Vec::with_capacity(originals.len());
            for (orig_id, text, true_label) in originals {
                tx.execute(
                    "UPDATE messages SET status = 'scored' WHERE id = ?1",
                    params![orig_id],
                )?;

                let label = if copy_label { true_label } else { None };
                let now = now_iso();
                tx.execute(
                    "INSERT INTO messages (text, source, true_label, status, created_at)
                     VALUES (?1, 'runtime', ?2, 'queued', ?3)",
                    params![text, label.clone(), now],
                )?;
                let id = tx.last_insert_rowid();
                created.push(
                    tx.query_row(
                        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                        params![id],
                        row_to_message,
                    )?,
                );
            }

            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)
}

fn select_unconsumed_holdout(
    tx: &rusqlite::Transaction<'_>,
    n: usize,
) -> rusqlite::Result<Vec<(i64, String, Option<String>)>> {
    let mut stmt = tx.prepare(
        "SELECT id, text, true_label FROM messages
         WHERE source = 'dataset' AND split = 'validation_holdout' AND status = 'dataset'
         ORDER BY id ASC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![n as i64], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })?;
    rows.collect()
}

/// Histogram of runtime messages by status.
pub async fn counts(db: &Database) -> Result<HashMap<MessageStatus, i64>, SmsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM messages
                 WHERE source = 'runtime' GROUP BY status",
            )?;
            let rows = stmt.query_map([], |row| {
                let status: MessageStatus = parse_enum(0, row.get(0)?)?;
                Ok((status, row.get::<_, i64>(1)?))
            })?;
            rows.collect::<rusqlite::Result<HashMap<_, _>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Labeled train-pool samples, ordered by id, capped at `cap` rows.
pub async fn train_pool_samples(
    db: &Database,
    cap: Option<usize>,
) -> Result<Vec<LabeledSample>, SmsiftError> {
    let limit = cap.map(|c| c as i64).unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT text, true_label FROM messages
                 WHERE source = 'dataset' AND split = 'train_pool' AND true_label IS NOT NULL
                 ORDER BY id ASC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], labeled_sample_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// All labeled validation-holdout samples, ordered by id.
///
/// The holdout is frozen at import; this query returns the identical set
/// for every training run within one import.
pub async fn validation_samples(db: &Database) -> Result<Vec<LabeledSample>, SmsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT text, true_label FROM messages
                 WHERE source = 'dataset' AND split = 'validation_holdout'
                   AND true_label IS NOT NULL
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], labeled_sample_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Ids of the validation holdout, ordered. Probe for holdout stability.
pub async fn validation_holdout_ids(db: &Database) -> Result<Vec<i64>, SmsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM messages
                 WHERE source = 'dataset' AND split = 'validation_holdout'
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

fn labeled_sample_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LabeledSample> {
    let label: Label = parse_enum(1, row.get(1)?)?;
    Ok(LabeledSample {
        text: row.get(0)?,
        is_spam: label == Label::Spam,
    })
}

/// Number of imported dataset rows.
pub async fn dataset_count(db: &Database) -> Result<i64, SmsiftError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE source = 'dataset'",
                [],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every imported dataset row (forced re-import).
pub async fn delete_dataset_rows(db: &Database) -> Result<usize, SmsiftError> {
    db.connection()
        .call(|conn| conn.execute("DELETE FROM messages WHERE source = 'dataset'", []))
        .await
        .map_err(map_tr_err)
}

/// Bulk-insert imported dataset rows in one transaction.
pub async fn insert_dataset_batch(
    db: &Database,
    rows: Vec<(String, Label, DatasetSplit)>,
) -> Result<usize, SmsiftError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = {
                let mut stmt = tx.prepare(
                    "INSERT INTO messages (text, source, split, true_label, status, created_at)
                     VALUES (?1, 'dataset', ?2, ?3, 'dataset', ?4)",
                )?;
                let mut inserted = 0usize;
                for (text, label, split) in rows {
                    stmt.execute(params![
                        text,
                        split.to_string(),
                        label.to_string(),
                        now_iso()
                    ])?;
                    inserted += 1;
                }
                inserted
            };
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_runtime_returns_queued_row() {
        let (db, _dir) = setup_db().await;
        let msg = insert_runtime(&db, "hello there").await.unwrap();
        assert!(msg.id > 0);
        assert_eq!(msg.status, MessageStatus::Queued);
        assert_eq!(msg.text, "hello there");
        assert!(msg.true_label.is_none());
        assert!(msg.last_model_version.is_none());
    }

    #[tokio::test]
    async fn oldest_queued_is_fifo() {
        let (db, _dir) = setup_db().await;
        let first = insert_runtime(&db, "first").await.unwrap();
        let _second = insert_runtime(&db, "second").await.unwrap();
        assert_eq!(oldest_queued_id(&db).await.unwrap(), Some(first.id));
    }

    #[tokio::test]
    async fn conditional_update_reports_affected_rows() {
        let (db, _dir) = setup_db().await;
        let msg = insert_runtime(&db, "claim me").await.unwrap();

        let won = update_status_if(&db, msg.id, MessageStatus::Queued, MessageStatus::Processing)
            .await
            .unwrap();
        assert_eq!(won, 1);

        // Second claim on the same row loses: the guard no longer matches.
        let lost = update_status_if(&db, msg.id, MessageStatus::Queued, MessageStatus::Processing)
            .await
            .unwrap();
        assert_eq!(lost, 0);

        let row = get(&db, msg.id).await.unwrap().unwrap();
        assert_eq!(row.status, MessageStatus::Processing);
    }

    async fn seed_holdout(db: &Database, n: usize) {
        let rows = (0..n)
            .map(|i| {
                (
                    format!("holdout message {i}"),
                    if i % 2 == 0 { Label::Ham } else { Label::Spam },
                    DatasetSplit::ValidationHoldout,
                )
            })
            .collect();
        insert_dataset_batch(db, rows).await.unwrap();
    }

    #[tokio::test]
    async fn enqueue_from_validation_copies_and_consumes() {
        let (db, _dir) = setup_db().await;
        seed_holdout(&db, 3).await;

        let created = enqueue_from_validation(&db, 2, true).await.unwrap();
        assert_eq!(created.len(), 2);
        for msg in &created {
            assert_eq!(msg.status, MessageStatus::Queued);
            assert!(msg.true_label.is_some(), "copy_label must carry the label");
        }

        // Two originals consumed, one left.
        let remaining = enqueue_from_validation(&db, 5, false).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].true_label.is_none());
    }

    #[tokio::test]
    async fn enqueue_from_validation_resets_when_exhausted() {
        let (db, _dir) = setup_db().await;
        seed_holdout(&db, 2).await;

        let first = enqueue_from_validation(&db, 5, false).await.unwrap();
        assert_eq!(first.len(), 2);

        // Pool exhausted: the set is reset and picked again.
        let second = enqueue_from_validation(&db, 5, false).await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn enqueue_from_validation_empty_pool_yields_nothing() {
        let (db, _dir) = setup_db().await;
        let created = enqueue_from_validation(&db, 5, true).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn counts_partitions_runtime_by_status() {
        let (db, _dir) = setup_db().await;
        let a = insert_runtime(&db, "a").await.unwrap();
        let _b = insert_runtime(&db, "b").await.unwrap();
        update_status_if(&db, a.id, MessageStatus::Queued, MessageStatus::Processing)
            .await
            .unwrap();
        // Dataset rows must not appear in the histogram.
        insert_dataset_batch(
            &db,
            vec![("ds".to_string(), Label::Ham, DatasetSplit::TrainPool)],
        )
        .await
        .unwrap();

        let histogram = counts(&db).await.unwrap();
        assert_eq!(histogram.get(&MessageStatus::Queued), Some(&1));
        assert_eq!(histogram.get(&MessageStatus::Processing), Some(&1));
        assert_eq!(histogram.get(&MessageStatus::Dataset), None);
    }

    #[tokio::test]
    async fn train_pool_cap_and_order() {
        let (db, _dir) = setup_db().await;
        let rows = (0..10)
            .map(|i| (format!("sample {i}"), Label::Ham, DatasetSplit::TrainPool))
            .collect();
        insert_dataset_batch(&db, rows).await.unwrap();

        let capped = train_pool_samples(&db, Some(4)).await.unwrap();
        assert_eq!(capped.len(), 4);
        assert_eq!(capped[0].text, "sample 0");

        let all = train_pool_samples(&db, None).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn validation_queries_ignore_train_pool() {
        let (db, _dir) = setup_db().await;
        insert_dataset_batch(
            &db,
            vec![
                ("t".to_string(), Label::Ham, DatasetSplit::TrainPool),
                ("v1".to_string(), Label::Spam, DatasetSplit::ValidationHoldout),
                ("v2".to_string(), Label::Ham, DatasetSplit::ValidationHoldout),
            ],
        )
        .await
        .unwrap();

        let samples = validation_samples(&db).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].is_spam);

        let ids = validation_holdout_ids(&db).await.unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn forced_reimport_deletes_only_dataset_rows() {
        let (db, _dir) = setup_db().await;
        insert_dataset_batch(
            &db,
            vec![("ds".to_string(), Label::Spam, DatasetSplit::TrainPool)],
        )
        .await
        .unwrap();
        insert_runtime(&db, "runtime survives").await.unwrap();

        assert_eq!(dataset_count(&db).await.unwrap(), 1);
        assert_eq!(delete_dataset_rows(&db).await.unwrap(), 1);
        assert_eq!(dataset_count(&db).await.unwrap(), 0);
        assert!(get(&db, 2).await.unwrap().is_some());
    }
}
