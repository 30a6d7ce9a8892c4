// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the smsift spam classification agent.
//!
//! This crate provides the foundational error type, domain types, and
//! capability traits used throughout the smsift workspace. The classifier
//! and event-observer backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SmsiftError;
pub use traits::{ClassifierAdapter, EventObserver, NullObserver};
pub use types::{
    DatasetSplit, Decision, EvalMetrics, Label, LabeledSample, MessageSource, MessageStatus,
    ModelVersion, Prediction, RetrainOutcome, Review, ScoreOutcome, SmsMessage, SystemSettings,
    TrainTemplate,
};
