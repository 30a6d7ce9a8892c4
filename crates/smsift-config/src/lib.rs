// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration crate for the smsift agent.
//!
//! Layered TOML configuration with `SMSIFT_` environment overrides,
//! loaded via Figment.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SmsiftConfig;
