// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent runtime for smsift: the services around the store and the
//! long-running cancellable workers built on them.
//!
//! The flow: producers enqueue text; the scoring runner claims one message
//! at a time, scores it against the active model version, and routes it;
//! moderator verdicts become gold labels; once enough gold accumulates,
//! the retrain runner trains a new version on the grown pool, evaluates it
//! on the frozen holdout, and atomically activates it for all subsequent
//! scoring.

pub mod import;
pub mod observer;
pub mod queue;
pub mod retrain;
pub mod review;
pub mod scorer;
pub mod scoring;
pub mod shutdown;
pub mod simulator;
pub mod training;

pub use import::{import_dataset, ImportReport};
pub use observer::LogObserver;
pub use queue::QueueService;
pub use retrain::RetrainRunner;
pub use review::{AutoRetrainCheck, ReviewService};
pub use scorer::ScoringRunner;
pub use scoring::ScoringService;
pub use simulator::SimulatorRunner;
pub use training::{TrainReport, TrainingService};
