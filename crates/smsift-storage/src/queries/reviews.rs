// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review queries.
//!
//! A moderator verdict is one transaction: the review row, the message's
//! terminal transition, and the gold-counter increment commit together.

use rusqlite::{params, OptionalExtension};
use smsift_core::types::{Label, LabeledSample, MessageStatus, Review};
use smsift_core::SmsiftError;

use crate::database::{map_tr_err, now_iso, Database};
use crate::queries::parse_enum;

fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        message_id: row.get(1)?,
        label: parse_enum(2, row.get(2)?)?,
        reviewed_by: row.get(3)?,
        reviewed_at: row.get(4)?,
        note: row.get(5)?,
    })
}

enum AddOutcome {
    Added(Review),
    NoSuchMessage,
    AlreadyReviewed,
}

/// Record a moderator verdict for a message.
///
/// Atomically: rejects a missing message (`NotFound`) or an existing review
/// (`Conflict`); writes the review; sets the message's `true_label` and
/// terminal status; increments `new_gold_since_last_train` by exactly one.
pub async fn add_review(
    db: &Database,
    message_id: i64,
    label: Label,
    reviewed_by: &str,
    note: Option<&str>,
) -> Result<Review, SmsiftError> {
    let reviewed_by = reviewed_by.to_string();
    let note = note.map(|n| n.to_string());
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let message_exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM messages WHERE id = ?1",
                    params![message_id],
                    |row| row.get(0),
                )
                .optional()?;
            if message_exists.is_none() {
                return Ok(AddOutcome::NoSuchMessage);
            }

            let already: Option<i64> = tx
                .query_row(
                    "SELECT id FROM reviews WHERE message_id = ?1",
                    params![message_id],
                    |row| row.get(0),
                )
                .optional()?;
            if already.is_some() {
                return Ok(AddOutcome::AlreadyReviewed);
            }

            let now = now_iso();
            tx.execute(
                "INSERT INTO reviews (message_id, label, reviewed_by, reviewed_at, note)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![message_id, label.to_string(), reviewed_by, now, note],
            )?;
            let review_id = tx.last_insert_rowid();

            let terminal = match label {
                Label::Ham => MessageStatus::InInbox,
                Label::Spam => MessageStatus::InSpam,
            };
            tx.execute(
                "UPDATE messages SET true_label = ?1, status = ?2 WHERE id = ?3",
                params![label.to_string(), terminal.to_string(), message_id],
            )?;

            tx.execute(
                "UPDATE system_settings
                 SET new_gold_since_last_train = new_gold_since_last_train + 1
                 WHERE id = 1",
                [],
            )?;

            let review = tx.query_row(
                "SELECT id, message_id, label, reviewed_by, reviewed_at, note
                 FROM reviews WHERE id = ?1",
                params![review_id],
                row_to_review,
            )?;
            tx.commit()?;
            Ok(AddOutcome::Added(review))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        AddOutcome::Added(review) => Ok(review),
        AddOutcome::NoSuchMessage => Err(SmsiftError::NotFound(format!(
            "message {message_id}"
        ))),
        AddOutcome::AlreadyReviewed => Err(SmsiftError::Conflict(format!(
            "message {message_id} already has a review"
        ))),
    }
}

/// The review for one message, if any.
pub async fn for_message(db: &Database, message_id: i64) -> Result<Option<Review>, SmsiftError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, message_id, label, reviewed_by, reviewed_at, note
                 FROM reviews WHERE message_id = ?1",
                params![message_id],
                row_to_review,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Every gold-labeled sample: reviewed messages with the moderator's label.
///
/// Ordered by review id so training sets are assembled deterministically.
pub async fn gold_samples(db: &Database) -> Result<Vec<LabeledSample>, SmsiftError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.text, r.label FROM reviews r
                 JOIN messages m ON m.id = r.message_id
                 ORDER BY r.id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let label: Label = parse_enum(1, row.get(1)?)?;
                Ok(LabeledSample {
                    text: row.get(0)?,
                    is_spam: label == Label::Spam,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of reviews.
pub async fn count(db: &Database) -> Result<i64, SmsiftError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}
