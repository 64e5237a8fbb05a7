/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Partition-replay engine: streams per-level outcome/mapping files and
//! maintains the current node→block assignment.

pub mod engine;
pub mod mapping;
pub mod outcome;
pub mod singleton_mapping;

pub use engine::{LevelTransition, ReplayEngine};
pub use mapping::MappingReader;
pub use outcome::OutcomeReader;
pub use singleton_mapping::SingletonMappingReader;
