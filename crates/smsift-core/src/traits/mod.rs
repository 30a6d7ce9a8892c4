// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits implemented by pluggable backends.

pub mod classifier;
pub mod observer;

pub use classifier::ClassifierAdapter;
pub use observer::{EventObserver, NullObserver};
