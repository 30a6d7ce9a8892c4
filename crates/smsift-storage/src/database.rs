// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and go through `conn.call()`.
//! Do NOT create additional Connection instances for writes.

use smsift_core::SmsiftError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection backing the agent.
///
/// Cheap to clone; all clones share one background writer thread, which
/// is what makes the conditional-update primitive atomic with respect to
/// concurrent workers in this process.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending schema migrations.
    pub async fn open(path: &str) -> Result<Self, SmsiftError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| SmsiftError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), SmsiftError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `SmsiftError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SmsiftError {
    SmsiftError::Storage {
        source: Box::new(e),
    }
}

/// ISO 8601 UTC timestamp with microsecond precision.
///
/// Microseconds keep `ORDER BY created_at` a strict FIFO even for rows
/// inserted in the same millisecond.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}
