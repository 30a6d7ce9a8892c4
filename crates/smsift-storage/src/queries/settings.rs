// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Singleton settings queries.
//!
//! Exactly one `system_settings` row exists for the process lifetime. It
//! is seeded from config defaults on first open; later opens keep whatever
//! was persisted at runtime.

use rusqlite::params;
use smsift_core::types::SystemSettings;
use smsift_core::SmsiftError;

use crate::database::{map_tr_err, now_iso, Database};

/// Seed values for the singleton row. Applied only when no row exists yet.
#[derive(Debug, Clone)]
pub struct SettingsSeed {
    pub threshold_allow: f64,
    pub threshold_block: f64,
    pub retrain_gold_threshold: i64,
    pub auto_retrain_enabled: bool,
}

impl Default for SettingsSeed {
    fn default() -> Self {
        Self {
            threshold_allow: 0.30,
            threshold_block: 0.70,
            retrain_gold_threshold: 100,
            auto_retrain_enabled: true,
        }
    }
}

/// Create the singleton row if it does not exist yet.
pub async fn ensure_seeded(db: &Database, seed: &SettingsSeed) -> Result<(), SmsiftError> {
    let seed = seed.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO system_settings
                 (id, threshold_allow, threshold_block, retrain_gold_threshold,
                  new_gold_since_last_train, auto_retrain_enabled)
                 VALUES (1, ?1, ?2, ?3, 0, ?4)",
                params![
                    seed.threshold_allow,
                    seed.threshold_block,
                    seed.retrain_gold_threshold,
                    seed.auto_retrain_enabled,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read the singleton row.
pub async fn get(db: &Database) -> Result<SystemSettings, SmsiftError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT active_model_version, threshold_allow, threshold_block,
                        retrain_gold_threshold, new_gold_since_last_train,
                        auto_retrain_enabled, last_retrain_at
                 FROM system_settings WHERE id = 1",
                [],
                |row| {
                    Ok(SystemSettings {
                        active_model_version: row.get(0)?,
                        threshold_allow: row.get(1)?,
                        threshold_block: row.get(2)?,
                        retrain_gold_threshold: row.get(3)?,
                        new_gold_since_last_train: row.get(4)?,
                        auto_retrain_enabled: row.get(5)?,
                        last_retrain_at: row.get(6)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Training completed: zero the gold counter and stamp the retrain time.
///
/// Called only on success. Reviews that landed after the training assembled
/// its gold set are still zeroed here; they count toward the next retrain
/// only if they commit after this update.
pub async fn mark_retrained(db: &Database) -> Result<(), SmsiftError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings
                 SET new_gold_since_last_train = 0, last_retrain_at = ?1
                 WHERE id = 1",
                params![now_iso()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Persist new decision thresholds.
pub async fn update_thresholds(
    db: &Database,
    threshold_allow: f64,
    threshold_block: f64,
) -> Result<(), SmsiftError> {
    if !(0.0..=1.0).contains(&threshold_allow) || !(0.0..=1.0).contains(&threshold_block) {
        return Err(SmsiftError::InvalidInput(
            "thresholds must be in [0, 1]".to_string(),
        ));
    }
    if threshold_allow > threshold_block {
        return Err(SmsiftError::InvalidInput(format!(
            "threshold_allow ({threshold_allow}) must not exceed threshold_block ({threshold_block})"
        )));
    }
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET threshold_allow = ?1, threshold_block = ?2 WHERE id = 1",
                params![threshold_allow, threshold_block],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Persist a new retrain policy (counter threshold and toggle).
pub async fn set_retrain_policy(
    db: &Database,
    retrain_gold_threshold: i64,
    auto_retrain_enabled: bool,
) -> Result<(), SmsiftError> {
    if retrain_gold_threshold < 0 {
        return Err(SmsiftError::InvalidInput(
            "retrain_gold_threshold must be non-negative".to_string(),
        ));
    }
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings
                 SET retrain_gold_threshold = ?1, auto_retrain_enabled = ?2
                 WHERE id = 1",
                params![retrain_gold_threshold, auto_retrain_enabled],
            )?;
            Ok(())
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
    async fn seed_applies_once() {
        let (db, _dir) = setup_db().await;
        ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();

        let s = get(&db).await.unwrap();
        assert_eq!(s.threshold_allow, 0.30);
        assert_eq!(s.threshold_block, 0.70);
        assert_eq!(s.retrain_gold_threshold, 100);
        assert_eq!(s.new_gold_since_last_train, 0);
        assert!(s.auto_retrain_enabled);
        assert!(s.active_model_version.is_none());
        assert!(s.last_retrain_at.is_none());

        // A different seed must not overwrite the existing row.
        let other = SettingsSeed {
            threshold_allow: 0.1,
            ..SettingsSeed::default()
        };
        ensure_seeded(&db, &other).await.unwrap();
        assert_eq!(get(&db).await.unwrap().threshold_allow, 0.30);
    }

    #[tokio::test]
    async fn mark_retrained_resets_counter() {
        let (db, _dir) = setup_db().await;
        ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();

        db.connection()
            .call(|conn| {
                conn.execute(
                    "UPDATE system_settings SET new_gold_since_last_train = 7 WHERE id = 1",
                    [],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        mark_retrained(&db).await.unwrap();
        let s = get(&db).await.unwrap();
        assert_eq!(s.new_gold_since_last_train, 0);
        assert!(s.last_retrain_at.is_some());
    }

    #[tokio::test]
    async fn threshold_updates_are_validated() {
        let (db, _dir) = setup_db().await;
        ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();

        update_thresholds(&db, 0.2, 0.8).await.unwrap();
        let s = get(&db).await.unwrap();
        assert_eq!(s.threshold_allow, 0.2);
        assert_eq!(s.threshold_block, 0.8);

        assert!(update_thresholds(&db, 0.9, 0.1).await.is_err());
        assert!(update_thresholds(&db, -0.1, 0.5).await.is_err());
        assert!(update_thresholds(&db, 0.5, 1.5).await.is_err());
    }

    #[tokio::test]
    async fn retrain_policy_updates() {
        let (db, _dir) = setup_db().await;
        ensure_seeded(&db, &SettingsSeed::default()).await.unwrap();

        set_retrain_policy(&db, 3, false).await.unwrap();
        let s = get(&db).await.unwrap();
        assert_eq!(s.retrain_gold_threshold, 3);
        assert!(!s.auto_retrain_enabled);

        assert!(set_retrain_policy(&db, -1, true).await.is_err());
    }
}
