// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model version queries, including the atomic active-pointer flip.

use rusqlite::{params, OptionalExtension};
use smsift_core::types::ModelVersion;
use smsift_core::SmsiftError;

use crate::database::{map_tr_err, now_iso, Database};
use crate::queries::parse_enum;

const VERSION_COLUMNS: &str = "version, train_template, train_set_size, gold_included_count, \
     validation_set_size, accuracy, precision, recall, f1, threshold_allow, threshold_block, \
     artifact_path, created_at, is_active";

fn row_to_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelVersion> {
    Ok(ModelVersion {
        version: row.get(0)?,
        train_template: parse_enum(1, row.get(1)?)?,
        train_set_size: row.get(2)?,
        gold_included_count: row.get(3)?,
        validation_set_size: row.get(4)?,
        accuracy: row.get(5)?,
        precision: row.get(6)?,
        recall: row.get(7)?,
        f1: row.get(8)?,
        threshold_allow: row.get(9)?,
        threshold_block: row.get(10)?,
        artifact_path: row.get(11)?,
        created_at: row.get(12)?,
        is_active: row.get(13)?,
    })
}

/// Next version number: `max(existing) + 1`, starting at 1.
pub async fn next_version(db: &Database) -> Result<i64, SmsiftError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COALESCE(MAX(version), 0) + 1 FROM model_versions",
                [],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Persist a freshly trained version. `created_at` is stamped here.
pub async fn insert(db: &Database, version: &ModelVersion) -> Result<(), SmsiftError> {
    let v = version.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO model_versions (version, train_template, train_set_size, \
                 gold_included_count, validation_set_size, accuracy, precision, recall, f1, \
                 threshold_allow, threshold_block, artifact_path, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    v.version,
                    v.train_template.to_string(),
                    v.train_set_size,
                    v.gold_included_count,
                    v.validation_set_size,
                    v.accuracy,
                    v.precision,
                    v.recall,
                    v.f1,
                    v.threshold_allow,
                    v.threshold_block,
                    v.artifact_path,
                    now_iso(),
                    v.is_active,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one version by number.
pub async fn get(db: &Database, version: i64) -> Result<Option<ModelVersion>, SmsiftError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM model_versions WHERE version = ?1"),
                params![version],
                row_to_version,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The unique active version, if any.
pub async fn active(db: &Database) -> Result<Option<ModelVersion>, SmsiftError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM model_versions WHERE is_active = 1"),
                [],
                row_to_version,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All versions, newest first.
pub async fn list(db: &Database) -> Result<Vec<ModelVersion>, SmsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {VERSION_COLUMNS} FROM model_versions ORDER BY version DESC"
            ))?;
            let rows = stmt.query_map([], row_to_version)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically flip the active pointer to `version`.
///
/// Clears the previous active flag, sets the new one, and updates the
/// settings back-reference in one transaction, so scoring observes either
/// the old version or the new one, never both or neither.
pub async fn activate(db: &Database, version: i64) -> Result<ModelVersion, SmsiftError> {
    let flipped = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("UPDATE model_versions SET is_active = 0 WHERE is_active = 1", [])?;
            let hit = tx.execute(
                "UPDATE model_versions SET is_active = 1 WHERE version = ?1",
                params![version],
            )?;
            if hit == 0 {
                // Roll back the clear; the target does not exist.
                return Ok(None);
            }
            tx.execute(
                "UPDATE system_settings SET active_model_version = ?1 WHERE id = 1",
                params![version],
            )?;
            let row = tx.query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM model_versions WHERE version = ?1"),
                params![version],
                row_to_version,
            )?;
            tx.commit()?;
            Ok(Some(row))
        })
        .await
        .map_err(map_tr_err)?;

    flipped.ok_or_else(|| SmsiftError::NotFound(format!("model version {version}")))
}

/// Minimal version row for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn test_version(version: i64) -> ModelVersion {
    use smsift_core::types::TrainTemplate;
    ModelVersion {
        version,
        train_template: TrainTemplate::Light,
        train_set_size: 500,
        gold_included_count: 0,
        validation_set_size: 100,
        accuracy: 0.95,
        precision: 0.9,
        recall: 0.85,
        f1: 0.87,
        threshold_allow: 0.3,
        threshold_block: 0.7,
        artifact_path: format!("models/model_v{version}.json"),
        created_at: String::new(),
        is_active: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::settings::{self, SettingsSeed};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        settings::ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();
        (db, dir)
    }

    fn make_version(version: i64) -> ModelVersion {
        test_version(version)
    }

    #[tokio::test]
    async fn versions_are_monotonic() {
        let (db, _dir) = setup_db().await;
        assert_eq!(next_version(&db).await.unwrap(), 1);

        insert(&db, &make_version(1)).await.unwrap();
        insert(&db, &make_version(2)).await.unwrap();
        assert_eq!(next_version(&db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_version_number_is_rejected() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_version(1)).await.unwrap();
        assert!(insert(&db, &make_version(1)).await.is_err());
    }

    #[tokio::test]
    async fn activate_flips_exactly_one_version() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_version(1)).await.unwrap();
        insert(&db, &make_version(2)).await.unwrap();

        activate(&db, 1).await.unwrap();
        assert_eq!(active(&db).await.unwrap().unwrap().version, 1);

        activate(&db, 2).await.unwrap();
        let act = active(&db).await.unwrap().unwrap();
        assert_eq!(act.version, 2);

        // The old version was deactivated in the same transaction.
        assert!(!get(&db, 1).await.unwrap().unwrap().is_active);

        let s = settings::get(&db).await.unwrap();
        assert_eq!(s.active_model_version, Some(2));
    }

    #[tokio::test]
    async fn activate_is_idempotent_for_active_version() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_version(1)).await.unwrap();
        activate(&db, 1).await.unwrap();
        activate(&db, 1).await.unwrap();
        assert_eq!(active(&db).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn activate_unknown_version_fails_and_keeps_current() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_version(1)).await.unwrap();
        activate(&db, 1).await.unwrap();

        let err = activate(&db, 99).await.unwrap_err();
        assert!(matches!(err, SmsiftError::NotFound { .. }));

        // The failed flip rolled back: version 1 is still active.
        assert_eq!(active(&db).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_version(1)).await.unwrap();
        insert(&db, &make_version(2)).await.unwrap();
        let all = list(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].version, 2);
    }
}
