// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prediction queries.
//!
//! A scoring commits two writes together: the immutable prediction row and
//! the message's routing update. They share one transaction so an observer
//! never sees a routed message without its prediction or vice versa.

use rusqlite::params;
use smsift_core::types::{Decision, MessageStatus, Prediction};
use smsift_core::SmsiftError;

use crate::database::{map_tr_err, now_iso, Database};
use crate::queries::parse_enum;

fn row_to_prediction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        id: row.get(0)?,
        message_id: row.get(1)?,
        model_version: row.get(2)?,
        p_spam: row.get(3)?,
        decision: parse_enum(4, row.get(4)?)?,
        created_at: row.get(5)?,
    })
}

/// Persist one scoring: insert the prediction and route the message.
pub async fn record_scoring(
    db: &Database,
    message_id: i64,
    model_version: i64,
    p_spam: f64,
    decision: Decision,
    new_status: MessageStatus,
) -> Result<Prediction, SmsiftError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = now_iso();
            tx.execute(
                "INSERT INTO predictions (message_id, model_version, p_spam, decision, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![message_id, model_version, p_spam, decision.to_string(), now],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE messages SET status = ?1, last_model_version = ?2 WHERE id = ?3",
                params![new_status.to_string(), model_version, message_id],
            )?;
            let prediction = tx.query_row(
                "SELECT id, message_id, model_version, p_spam, decision, created_at
                 FROM predictions WHERE id = ?1",
                params![id],
                row_to_prediction,
            )?;
            tx.commit()?;
            Ok(prediction)
        })
        .await
        .map_err(map_tr_err)
}

/// Predictions for one message, chronological across model versions.
pub async fn for_message(db: &Database, message_id: i64) -> Result<Vec<Prediction>, SmsiftError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, message_id, model_version, p_spam, decision, created_at
                 FROM predictions WHERE message_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![message_id], row_to_prediction)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Total prediction rows. Used by tests and the status command.
pub async fn count(db: &Database) -> Result<i64, SmsiftError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}
