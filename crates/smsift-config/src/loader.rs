// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./smsift.toml` > `~/.config/smsift/smsift.toml` > `/etc/smsift/smsift.toml`
//! with environment variable overrides via `SMSIFT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SmsiftConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/smsift/smsift.toml` (system-wide)
/// 3. `~/.config/smsift/smsift.toml` (user XDG config)
/// 4. `./smsift.toml` (local directory)
/// 5. `SMSIFT_*` environment variables
pub fn load_config() -> Result<SmsiftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsiftConfig::default()))
        .merge(Toml::file("/etc/smsift/smsift.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("smsift/smsift.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("smsift.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<SmsiftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsiftConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SmsiftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsiftConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `SMSIFT_SCORER_IDLE_DELAY_MS`
/// must map to `scorer.idle_delay_ms`, not `scorer.idle.delay.ms`.
fn env_provider() -> Env {
    Env::prefixed("SMSIFT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: SMSIFT_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("dataset_", "dataset.", 1)
            .replacen("models_", "models.", 1)
            .replacen("defaults_", "defaults.", 1)
            .replacen("scorer_", "scorer.", 1)
            .replacen("retrain_", "retrain.", 1)
            .replacen("simulator_", "simulator.", 1);
        mapped.into()
    })
}
