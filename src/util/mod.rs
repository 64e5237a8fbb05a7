/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Ambient utilities: progress logging and process memory sampling.

pub mod memory;
pub mod progress;

pub use memory::{current_memory_kb, PeakMemoryTracker};
pub use progress::ProgressLogger;
