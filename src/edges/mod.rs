/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Edge folder: Phase I terminal-level folding plus Phase II backward
//! lifting through the refinement hierarchy.

pub mod folder;
pub mod triples;

pub use folder::{fold_terminal_level, lift_backward, terminal_relation};
pub use triples::{Triple, TripleReader};
