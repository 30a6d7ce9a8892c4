// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic keyword stub for tests and CI.
//!
//! Scores by keyword presence: any hit yields a fixed high spam
//! probability, no hit a fixed low one. No corpus statistics involved, so
//! assertions on routing outcomes stay exact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use smsift_core::types::{EvalMetrics, LabeledSample};
use smsift_core::{ClassifierAdapter, SmsiftError};

const DEFAULT_KEYWORDS: &[&str] = &[
    "free", "win", "winner", "prize", "urgent", "claim", "cash", "award",
];

const SPAM_SCORE: f64 = 0.95;
const HAM_SCORE: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeywordArtifact {
    keywords: Vec<String>,
}

/// Rule-based classifier stub implementing the full capability contract.
pub struct KeywordClassifier {
    keywords: RwLock<Vec<String>>,
    loaded: RwLock<bool>,
}

impl KeywordClassifier {
    /// A stub that still requires `train` or `load` before `predict`.
    pub fn new() -> Self {
        Self {
            keywords: RwLock::new(default_keywords()),
            loaded: RwLock::new(false),
        }
    }

    /// A stub ready to predict immediately. For unit tests that skip training.
    pub fn preloaded() -> Self {
        Self {
            keywords: RwLock::new(default_keywords()),
            loaded: RwLock::new(true),
        }
    }

    async fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let keywords = self.keywords.read().await;
        if keywords.iter().any(|k| lower.contains(k.as_str())) {
            SPAM_SCORE
        } else {
            HAM_SCORE
        }
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassifierAdapter for KeywordClassifier {
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

        let artifact = KeywordArtifact {
            keywords: self.keywords.read().await.clone(),
        };
        if let Some(parent) = artifact_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SmsiftError::Io { source })?;
        }
        let bytes = serde_json::to_vec(&artifact)
            .map_err(|e| SmsiftError::Internal(format!("artifact serialization failed: {e}")))?;
        tokio::fs::write(artifact_path, bytes)
            .await
            .map_err(|source| SmsiftError::Io { source })?;

        *self.loaded.write().await = true;
        Ok(artifact_path.to_path_buf())
    }

    async fn evaluate(&self, samples: &[LabeledSample]) -> Result<EvalMetrics, SmsiftError> {
        if !*self.loaded.read().await {
            return Err(SmsiftError::NotReady);
        }
        let (mut tp, mut tn, mut fp, mut fne) = (0u64, 0u64, 0u64, 0u64);
        for sample in samples {
            let predicted_spam = self.score(&sample.text).await >= 0.5;
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
        let artifact: KeywordArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| SmsiftError::Internal(format!("artifact deserialization failed: {e}")))?;

        *self.keywords.write().await = artifact.keywords;
        *self.loaded.write().await = true;
        Ok(())
    }

    async fn predict(&self, text: &str) -> Result<f64, SmsiftError> {
        if text.trim().is_empty() {
            return Err(SmsiftError::InvalidInput(
                "cannot score empty text".to_string(),
            ));
        }
        if !*self.loaded.read().await {
            return Err(SmsiftError::NotReady);
        }
        Ok(self.score(text).await)
    }

    async fn is_loaded(&self) -> bool {
        *self.loaded.read().await
    }
}
