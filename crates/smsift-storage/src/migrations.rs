// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations, gated on `PRAGMA user_version`.
//!
//! Each migration is a batch of DDL applied inside a transaction; the
//! user_version is bumped with the batch so a crash mid-migration
//! re-applies cleanly on the next open.

/// Schema version the binary expects.
const SCHEMA_VERSION: i64 = 1;

const V1_INITIAL: &str = "
CREATE TABLE messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    source TEXT NOT NULL,
    split TEXT,
    true_label TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_model_version INTEGER REFERENCES model_versions(version)
);
CREATE INDEX idx_messages_source_split ON messages(source, split);
CREATE INDEX idx_messages_status ON messages(status);
CREATE INDEX idx_messages_created_at ON messages(created_at);

CREATE TABLE predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL REFERENCES messages(id),
    model_version INTEGER NOT NULL REFERENCES model_versions(version),
    p_spam REAL NOT NULL,
    decision TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX idx_predictions_message ON predictions(message_id);

CREATE TABLE reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL UNIQUE REFERENCES messages(id),
    label TEXT NOT NULL,
    reviewed_by TEXT NOT NULL,
    reviewed_at TEXT NOT NULL,
    note TEXT
);

CREATE TABLE model_versions (
    version INTEGER PRIMARY KEY,
    train_template TEXT NOT NULL,
    train_set_size INTEGER NOT NULL,
    gold_included_count INTEGER NOT NULL,
    validation_set_size INTEGER NOT NULL,
    accuracy REAL NOT NULL,
    precision REAL NOT NULL,
    recall REAL NOT NULL,
    f1 REAL NOT NULL,
    threshold_allow REAL NOT NULL,
    threshold_block REAL NOT NULL,
    artifact_path TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE system_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    active_model_version INTEGER REFERENCES model_versions(version),
    threshold_allow REAL NOT NULL,
    threshold_block REAL NOT NULL,
    retrain_gold_threshold INTEGER NOT NULL,
    new_gold_since_last_train INTEGER NOT NULL DEFAULT 0,
    auto_retrain_enabled INTEGER NOT NULL,
    last_retrain_at TEXT
);
";

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if current < 1 {
        tx.execute_batch(V1_INITIAL)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}
