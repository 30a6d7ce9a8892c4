// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier capability trait.
//!
//! The agent treats the classifier as an opaque capability with four
//! operations. Swapping the algorithm (naive Bayes, a rule-based stub for
//! tests) must never touch the agent runners.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SmsiftError;
use crate::types::{EvalMetrics, LabeledSample};

/// Adapter for text classification backends.
///
/// After a successful `train` or `load`, `predict` is safe to call from
/// any number of tasks concurrently. A `load` racing with `predict` must
/// never expose a half-loaded model; implementations guard the swap with
/// a lock or replace the model pointer atomically.
#[async_trait]
pub trait ClassifierAdapter: Send + Sync {
    /// Fit a model on the given samples and persist it at `artifact_path`.
    ///
    /// The freshly trained model becomes the in-memory model. Fails with
    /// `InvalidInput` on an empty sample set and `Io` on artifact write.
    async fn train(
        &self,
        samples: &[LabeledSample],
        artifact_path: &Path,
    ) -> Result<PathBuf, SmsiftError>;

    /// Score the in-memory model against labeled samples.
    ///
    /// Fails with `NotReady` when no model has been trained or loaded.
    async fn evaluate(&self, samples: &[LabeledSample]) -> Result<EvalMetrics, SmsiftError>;

    /// Replace the in-memory model with the artifact at `artifact_path`.
    ///
    /// Fails with `NotFound` when the file is missing.
    async fn load(&self, artifact_path: &Path) -> Result<(), SmsiftError>;

    /// Spam probability in `[0, 1]` for a non-empty text.
    ///
    /// Fails with `NotReady` when no model is loaded.
    async fn predict(&self, text: &str) -> Result<f64, SmsiftError>;

    /// Whether a model is currently held in memory. Cheap.
    async fn is_loaded(&self) -> bool;
}
