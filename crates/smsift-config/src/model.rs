// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the smsift agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level smsift configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsiftConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dataset import settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Model artifact settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Seed values for the singleton settings row.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Scoring runner settings.
    #[serde(default)]
    pub scorer: ScorerConfig,

    /// Retrain runner settings.
    #[serde(default)]
    pub retrain: RetrainConfig,

    /// Optional validation-holdout feeder.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl SmsiftConfig {
    /// Reject configurations that violate cross-field invariants.
    pub fn validate(&self) -> Result<(), String> {
        let d = &self.defaults;
        if !(0.0..=1.0).contains(&d.threshold_allow) {
            return Err(format!(
                "defaults.threshold_allow must be in [0,1], got {}",
                d.threshold_allow
            ));
        }
        if !(0.0..=1.0).contains(&d.threshold_block) {
            return Err(format!(
                "defaults.threshold_block must be in [0,1], got {}",
                d.threshold_block
            ));
        }
        if d.threshold_allow > d.threshold_block {
            return Err(format!(
                "defaults.threshold_allow ({}) must not exceed defaults.threshold_block ({})",
                d.threshold_allow, d.threshold_block
            ));
        }
        if self.scorer.workers == 0 {
            return Err("scorer.workers must be at least 1".to_string());
        }
        if self.simulator.enabled && self.simulator.batch_size == 0 {
            return Err("simulator.batch_size must be at least 1 when enabled".to_string());
        }
        Ok(())
    }
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "smsift".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "smsift.db".to_string()
}

/// Dataset import configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Source file for the initial import: one `<label>\t<text>` record per line.
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

fn default_dataset_path() -> String {
    "Dataset/SMSSpamCollection".to_string()
}

/// Model artifact configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Directory where classifier artifacts are written.
    #[serde(default = "default_models_directory")]
    pub directory: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            directory: default_models_directory(),
        }
    }
}

fn default_models_directory() -> String {
    "models".to_string()
}

/// Seed values for the singleton settings row. Runtime changes persist
/// through the store and take precedence over these on subsequent starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Below this spam probability a message is allowed outright.
    #[serde(default = "default_threshold_allow")]
    pub threshold_allow: f64,

    /// At or above this spam probability a message is blocked outright.
    #[serde(default = "default_threshold_block")]
    pub threshold_block: f64,

    /// Gold-label count that triggers auto-retrain. Zero disables it.
    #[serde(default = "default_retrain_gold_threshold")]
    pub retrain_gold_threshold: i64,

    /// Whether the retrain loop acts on the gold counter.
    #[serde(default = "default_auto_retrain_enabled")]
    pub auto_retrain_enabled: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            threshold_allow: default_threshold_allow(),
            threshold_block: default_threshold_block(),
            retrain_gold_threshold: default_retrain_gold_threshold(),
            auto_retrain_enabled: default_auto_retrain_enabled(),
        }
    }
}

fn default_threshold_allow() -> f64 {
    0.30
}

fn default_threshold_block() -> f64 {
    0.70
}

fn default_retrain_gold_threshold() -> i64 {
    100
}

fn default_auto_retrain_enabled() -> bool {
    true
}

/// Scoring runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerConfig {
    /// Number of parallel scoring workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Sleep when no model is active yet.
    #[serde(default = "default_not_ready_delay_ms")]
    pub not_ready_delay_ms: u64,

    /// Sleep when the queue is empty.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,

    /// Sleep after successfully scoring a message.
    #[serde(default = "default_busy_delay_ms")]
    pub busy_delay_ms: u64,

    /// Sleep after a tick fails.
    #[serde(default = "default_error_delay_ms")]
    pub error_delay_ms: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            not_ready_delay_ms: default_not_ready_delay_ms(),
            idle_delay_ms: default_idle_delay_ms(),
            busy_delay_ms: default_busy_delay_ms(),
            error_delay_ms: default_error_delay_ms(),
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_not_ready_delay_ms() -> u64 {
    2000
}

fn default_idle_delay_ms() -> u64 {
    500
}

fn default_busy_delay_ms() -> u64 {
    100
}

fn default_error_delay_ms() -> u64 {
    1000
}

/// Retrain runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrainConfig {
    /// Interval between counter checks.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Sleep after a failed training attempt.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,

    /// Template used by counter-triggered trainings: "light", "medium", or "full".
    #[serde(default = "default_template")]
    pub default_template: String,
}

impl Default for RetrainConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            default_template: default_template(),
        }
    }
}

fn default_check_interval_ms() -> u64 {
    10_000
}

fn default_error_backoff_ms() -> u64 {
    5_000
}

fn default_template() -> String {
    "light".to_string()
}

/// Optional feeder that periodically enqueues holdout messages,
/// exercising the scoring loop against known labels.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Interval between enqueue batches.
    #[serde(default = "default_simulator_interval_ms")]
    pub interval_ms: u64,

    /// Holdout messages enqueued per batch.
    #[serde(default = "default_simulator_batch_size")]
    pub batch_size: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_simulator_interval_ms(),
            batch_size: default_simulator_batch_size(),
        }
    }
}

fn default_simulator_interval_ms() -> u64 {
    2000
}

fn default_simulator_batch_size() -> usize {
    5
}
