// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the smsift agent.
//!
//! The store exclusively owns entity state; every mutation goes through
//! the typed query modules here. Multi-row invariants (review verdicts,
//! scoring commits, the active-version flip) are enforced with rusqlite
//! transactions; exclusive queue claims rest on the conditional-update
//! primitive in [`queries::messages::update_status_if`].

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use queries::settings::SettingsSeed;
