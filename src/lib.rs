/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Assembles a condensed, multi-level forward-bisimulation summary graph
//! from the outcome of a per-level partition refinement, and extracts
//! quotient graphs from the result on demand.

pub mod assembler;
pub mod codec;
pub mod edges;
pub mod error;
pub mod identity;
pub mod ids;
pub mod intervals;
pub mod names;
pub mod quotient;
pub mod replay;
pub mod stats;
pub mod store;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
