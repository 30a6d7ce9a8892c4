// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the smsift workspace.
//!
//! Enum values are persisted as TEXT columns using their strum
//! `snake_case` representation, so renaming a variant is a schema change.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ground-truth or moderator-assigned class of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Ham,
    Spam,
}

/// Where a message row came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// Imported from the labeled dataset file.
    Dataset,
    /// Produced at runtime (HTTP, CLI, simulator).
    Runtime,
}

/// Partition assigned to a dataset row at import time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DatasetSplit {
    /// Eligible for training-set assembly.
    TrainPool,
    /// Frozen holdout used for every evaluation; never trained on.
    ValidationHoldout,
}

/// Lifecycle state of a message.
///
/// Valid transitions: `Dataset -> Queued` (runtime copy; the original is
/// marked `Scored`), `Queued -> Processing` (exclusive claim),
/// `Processing -> {InInbox, InSpam, PendingReview}`,
/// `PendingReview -> {InInbox, InSpam}` (moderator verdict).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Imported sample, never enqueued directly.
    Dataset,
    /// Awaiting scoring.
    Queued,
    /// Claimed by exactly one scorer.
    Processing,
    /// Terminal: delivered to the inbox.
    InInbox,
    /// Terminal: routed to spam.
    InSpam,
    /// Scorer deferred; awaits a moderator verdict.
    PendingReview,
    /// Consumed dataset original; not eligible for re-use.
    Scored,
}

/// Outcome of the three-zone decision policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    PendingReview,
    Block,
}

/// Sizing preset controlling the training-set cap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainTemplate {
    Light,
    Medium,
    Full,
}

impl TrainTemplate {
    /// Maximum number of dataset rows drawn into the training set.
    /// `None` means unbounded.
    pub fn size_cap(&self) -> Option<usize> {
        match self {
            TrainTemplate::Light => Some(500),
            TrainTemplate::Medium => Some(2000),
            TrainTemplate::Full => None,
        }
    }
}

/// The unit of work flowing through the queue and the scoring agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Monotonic row identifier.
    pub id: i64,
    /// Message body. Never empty.
    pub text: String,
    pub source: MessageSource,
    pub split: Option<DatasetSplit>,
    pub true_label: Option<Label>,
    pub status: MessageStatus,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// Version of the model that last scored this message.
    pub last_model_version: Option<i64>,
}

/// Immutable record of one scoring of one message by one model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub message_id: i64,
    pub model_version: i64,
    /// Spam probability in `[0, 1]`.
    pub p_spam: f64,
    pub decision: Decision,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// A moderator's gold label for a message. At most one per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub message_id: i64,
    pub label: Label,
    pub reviewed_by: String,
    /// ISO 8601 timestamp of the verdict.
    pub reviewed_at: String,
    pub note: Option<String>,
}

/// Artifact metadata produced by one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Globally unique, monotonically increasing version number.
    pub version: i64,
    pub train_template: TrainTemplate,
    pub train_set_size: i64,
    /// How many gold-labeled (reviewed) rows the training set included.
    pub gold_included_count: i64,
    pub validation_set_size: i64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Thresholds in effect when this version was trained.
    pub threshold_allow: f64,
    pub threshold_block: f64,
    /// Filesystem path of the persisted classifier artifact.
    pub artifact_path: String,
    pub created_at: String,
    pub is_active: bool,
}

/// Singleton control state for the running agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Version number of the active model, if any training has activated one.
    pub active_model_version: Option<i64>,
    /// Below this spam probability a message is allowed outright.
    pub threshold_allow: f64,
    /// At or above this spam probability a message is blocked outright.
    pub threshold_block: f64,
    /// Gold-label count that triggers auto-retrain. Zero disables the trigger.
    pub retrain_gold_threshold: i64,
    /// Reviews accumulated since the last successful training.
    pub new_gold_since_last_train: i64,
    pub auto_retrain_enabled: bool,
    pub last_retrain_at: Option<String>,
}

/// One `(text, is_spam)` pair fed to the classifier capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSample {
    pub text: String,
    pub is_spam: bool,
}

impl LabeledSample {
    pub fn new(text: impl Into<String>, is_spam: bool) -> Self {
        Self {
            text: text.into(),
            is_spam,
        }
    }
}

/// Classifier quality metrics over a labeled sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: u64,
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl EvalMetrics {
    /// Derive the four ratio metrics from a confusion matrix.
    ///
    /// Zero-denominator convention: precision, recall, and F1 are defined
    /// as 0.0 when their denominator is 0; accuracy over an empty set is 0.0.
    pub fn from_confusion(tp: u64, tn: u64, fp: u64, fne: u64) -> Self {
        let total = tp + tn + fp + fne;
        let accuracy = if total == 0 {
            0.0
        } else {
            (tp + tn) as f64 / total as f64
        };
        let precision = if tp + fp == 0 {
            0.0
        } else {
            tp as f64 / (tp + fp) as f64
        };
        let recall = if tp + fne == 0 {
            0.0
        } else {
            tp as f64 / (tp + fne) as f64
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            accuracy,
            precision,
            recall,
            f1,
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fne,
        }
    }
}

/// Result record emitted by the scoring runner after each scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub message_id: i64,
    pub text: String,
    pub p_spam: f64,
    pub decision: Decision,
    pub new_status: MessageStatus,
    pub true_label: Option<Label>,
    /// `None` when the decision was deferred to review.
    pub is_correct: Option<bool>,
}

/// Result record emitted by the retrain runner after each training attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainOutcome {
    pub success: bool,
    pub new_version: Option<i64>,
    pub metrics: Option<EvalMetrics>,
    pub template: TrainTemplate,
    pub activated: bool,
    pub reason: String,
    /// ISO 8601 timestamp of the attempt.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            MessageStatus::Dataset,
            MessageStatus::Queued,
            MessageStatus::Processing,
            MessageStatus::InInbox,
            MessageStatus::InSpam,
            MessageStatus::PendingReview,
            MessageStatus::Scored,
        ] {
            let s = status.to_string();
            assert_eq!(MessageStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(MessageStatus::PendingReview.to_string(), "pending_review");
        assert_eq!(MessageStatus::InInbox.to_string(), "in_inbox");
    }

    #[test]
    fn template_size_caps() {
        assert_eq!(TrainTemplate::Light.size_cap(), Some(500));
        assert_eq!(TrainTemplate::Medium.size_cap(), Some(2000));
        assert_eq!(TrainTemplate::Full.size_cap(), None);
        assert_eq!(TrainTemplate::from_str("full").unwrap(), TrainTemplate::Full);
    }

    #[test]
    fn metrics_from_confusion() {
        let m = EvalMetrics::from_confusion(8, 80, 2, 10);
        assert!((m.accuracy - 0.88).abs() < 1e-9);
        assert!((m.precision - 0.8).abs() < 1e-9);
        assert!((m.recall - 8.0 / 18.0).abs() < 1e-9);
        assert!(m.f1 > 0.0);
    }

    #[test]
    fn metrics_zero_denominators() {
        // No positives predicted and none present: every ratio is defined as 0.
        let m = EvalMetrics::from_confusion(0, 10, 0, 0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.accuracy, 1.0);

        let empty = EvalMetrics::from_confusion(0, 0, 0, 0);
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.f1, 0.0);
    }

    #[test]
    fn label_serde_snake_case() {
        let json = serde_json::to_string(&Label::Spam).unwrap();
        assert_eq!(json, r#""spam""#);
        let parsed: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Label::Spam);
    }
}
