// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier capability backends for the smsift agent.
//!
//! [`BayesClassifier`] is the default backend; [`KeywordClassifier`] is a
//! deterministic stub used by tests. Both implement
//! `smsift_core::ClassifierAdapter`, and the agent runners never know
//! which one they are talking to.

pub mod bayes;
pub mod mock;

pub use bayes::BayesClassifier;
pub use mock::KeywordClassifier;
