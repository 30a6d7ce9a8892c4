// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multinomial naive Bayes over word tokens.
//!
//! Deliberately simple: the agent runtime treats the classifier as an
//! opaque capability, and this backend exists so the system is complete
//! end to end. Artifacts are JSON token-count tables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use smsift_core::types::{EvalMetrics, LabeledSample};
use smsift_core::{ClassifierAdapter, SmsiftError};

/// Persisted model state: per-class token counts plus document priors.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BayesModel {
    spam_tokens: HashMap<String, u64>,
    ham_tokens: HashMap<String, u64>,
    spam_token_total: u64,
    ham_token_total: u64,
    spam_docs: u64,
    ham_docs: u64,
    vocabulary_size: u64,
}

impl BayesModel {
    fn fit(samples: &[LabeledSample]) -> Self {
        let mut spam_tokens: HashMap<String, u64> = HashMap::new();
        let mut ham_tokens: HashMap<String, u64> = HashMap::new();
        let mut spam_docs = 0u64;
        let mut ham_docs = 0u64;

        for sample in samples {
            let bucket = if sample.is_spam {
                spam_docs += 1;
                &mut spam_tokens
            } else {
                ham_docs += 1;
                &mut ham_tokens
            };
            for token in tokenize(&sample.text) {
                *bucket.entry(token).or_insert(0) += 1;
            }
        }

        let spam_token_total = spam_tokens.values().sum();
        let ham_token_total = ham_tokens.values().sum();
        let mut vocabulary: std::collections::HashSet<&str> = std::collections::HashSet::new();
        vocabulary.extend(spam_tokens.keys().map(String::as_str));
        vocabulary.extend(ham_tokens.keys().map(String::as_str));
        let vocabulary_size = vocabulary.len() as u64;

        Self {
            spam_tokens,
            ham_tokens,
            spam_token_total,
            ham_token_total,
            spam_docs,
            ham_docs,
            vocabulary_size,
        }
    }

    /// Posterior spam probability via the two-class log-odds.
    fn p_spam(&self, text: &str) -> f64 {
        let total_docs = (self.spam_docs + self.ham_docs) as f64;
        // Laplace-smoothed priors keep the math finite for one-class models.
        let mut log_spam = ((self.spam_docs as f64 + 1.0) / (total_docs + 2.0)).ln();
        let mut log_ham = ((self.ham_docs as f64 + 1.0) / (total_docs + 2.0)).ln();

        let vocab = self.vocabulary_size as f64;
        for token in tokenize(text) {
            let spam_count = self.spam_tokens.get(&token).copied().unwrap_or(0) as f64;
            let ham_count = self.ham_tokens.get(&token).copied().unwrap_or(0) as f64;
            log_spam += ((spam_count + 1.0) / (self.spam_token_total as f64 + vocab + 1.0)).ln();
            log_ham += ((ham_count + 1.0) / (self.ham_token_total as f64 + vocab + 1.0)).ln();
        }

        // sigmoid(log_spam - log_ham) == exp(ls) / (exp(ls) + exp(lh))
        let odds = log_spam - log_ham;
        1.0 / (1.0 + (-odds).exp())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Naive Bayes classifier capability.
///
/// The in-memory model sits behind an `RwLock`: `predict` takes a read
/// lock, `train`/`load` take the write lock, so a swap never exposes a
/// half-loaded model to concurrent scorers.
pub struct BayesClassifier {
    model: RwLock<Option<BayesModel>>,
}

impl BayesClassifier {
    pub fn new() -> Self {
        Self {
            model: RwLock::new(None),
        }
    }
}

impl Default for BayesClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassifierAdapter for BayesClassifier {
    async fn train(
        &self,
        samples: &[LabeledSample],
        artifact_path: &Path,
    ) -> Result<PathBuf, SmsiftError> {
        if samples.is_empty() {
            return Err(SmsiftError::InvalidInput(
                "cannot train on an empty sample set".to_string(),
            ));
        }

        let model = BayesModel::fit(samples);

        if let Some(parent) = artifact_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SmsiftError::Io { source })?;
        }
        let bytes = serde_json::to_vec(&model)
            .map_err(|e| SmsiftError::Internal(format!("artifact serialization failed: {e}")))?;
        tokio::fs::write(artifact_path, bytes)
            .await
            .map_err(|source| SmsiftError::Io { source })?;

        info!(
            samples = samples.len(),
            vocabulary = model.vocabulary_size,
            artifact = %artifact_path.display(),
            "naive bayes model trained"
        );

        // Swap in the fresh model only after the artifact is durable.
        *self.model.write().await = Some(model);
        Ok(artifact_path.to_path_buf())
    }

    async fn evaluate(&self, samples: &[LabeledSample]) -> Result<EvalMetrics, SmsiftError> {
        let guard = self.model.read().await;
        let model = guard.as_ref().ok_or(SmsiftError::NotReady)?;

        let (mut tp, mut tn, mut fp, mut fne) = (0u64, 0u64, 0u64, 0u64);
        for sample in samples {
            let predicted_spam = model.p_spam(&sample.text) >= 0.5;
            match (sample.is_spam, predicted_spam) {
                (true, true) => tp += 1,
                (false, false) => tn += 1,
                (false, true) => fp += 1,
                (true, false) => fne += 1,
            }
        }
        Ok(EvalMetrics::from_confusion(tp, tn, fp, fne))
    }

    async fn load(&self, artifact_path: &Path) -> Result<(), SmsiftError> {
        let bytes = match tokio::fs::read(artifact_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SmsiftError::NotFound(format!(
                    "artifact {}",
                    artifact_path.display()
                )));
            }
            Err(source) => return Err(SmsiftError::Io { source }),
        };
        let model: BayesModel = serde_json::from_slice(&bytes)
            .map_err(|e| SmsiftError::Internal(format!("artifact deserialization failed: {e}")))?;

        *self.model.write().await = Some(model);
        debug!(artifact = %artifact_path.display(), "naive bayes model loaded");
        Ok(())
    }

    async fn predict(&self, text: &str) -> Result<f64, SmsiftError> {
        if text.trim().is_empty() {
            return Err(SmsiftError::InvalidInput(
                "cannot score empty text".to_string(),
            ));
        }
        let guard = self.model.read().await;
        let model = guard.as_ref().ok_or(SmsiftError::NotReady)?;
        Ok(model.p_spam(text).clamp(0.0, 1.0))
    }

    async fn is_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }
}
