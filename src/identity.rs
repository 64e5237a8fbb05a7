/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Assigns globally unique [`SummaryId`]s to block instances as they are
//! born, keyed by `(Level, LocalBlockId)`. Singletons never go through this
//! allocator — their id is computed directly from the node id.

use crate::codec::block_or_singleton::{read_block_or_singleton, write_block_or_singleton};
use crate::codec::k::{read_k, write_k};
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::ids::{Level, LocalBlockId, SummaryId, UNIVERSAL_ID};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

/// Largest positive value a 40-bit two's-complement BLOCK_OR_SINGLETON can hold.
const MAX_SUMMARY_ID: SummaryId = (1i64 << 39) - 1;

/// A monotonic counter handing out fresh `SummaryId`s for `(level, local_block_id)`
/// pairs, plus the reverse lookup used by the edge folder and quotient extractor.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    next: SummaryId,
    by_level: HashMap<Level, HashMap<LocalBlockId, SummaryId>>,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self {
            next: 1,
            by_level: HashMap::new(),
        }
    }

    /// Looks up the id already allocated for `(level, local)`, if any.
    pub fn lookup(&self, level: Level, local: LocalBlockId) -> Option<SummaryId> {
        self.by_level.get(&level)?.get(&local).copied()
    }

    /// Allocates a fresh id for `(level, local)` at its birth level.
    ///
    /// Panics (as an invariant violation) if the pair was already allocated —
    /// callers must check [`Self::lookup`] first when re-visiting a pair is
    /// legitimate (e.g. blocks that persist unchanged across a level).
    pub fn allocate(
        &mut self,
        level: Level,
        local: LocalBlockId,
        stage: &'static str,
        path: &Path,
    ) -> Result<SummaryId> {
        if let Some(existing) = self.lookup(level, local) {
            return Ok(existing);
        }
        if self.next > MAX_SUMMARY_ID {
            return Err(AssemblerError::overflow(
                stage,
                path,
                RecordIndex(self.next as u64),
                format!("global id counter exceeded {MAX_SUMMARY_ID}"),
            ));
        }
        let id = self.next;
        self.next += 1;
        self.by_level.entry(level).or_default().insert(local, id);
        Ok(id)
    }

    /// Registers `(level, local)` as referring to the already-allocated
    /// `id`, without consuming the counter. Used when a block's local id
    /// carries over unchanged from the previous level.
    pub fn alias(&mut self, level: Level, local: LocalBlockId, id: SummaryId) {
        self.by_level.entry(level).or_default().insert(local, id);
    }

    /// The reserved universal-block sentinel, never handed out by [`Self::allocate`].
    pub fn universal(&self) -> SummaryId {
        UNIVERSAL_ID
    }

    pub fn len(&self) -> usize {
        self.by_level.values().map(|m| m.len()).sum()
    }

    /// The number of distinct blocks allocated at `level` specifically (as
    /// opposed to [`Self::len`], which counts every level ever seen).
    pub fn count_at(&self, level: Level) -> usize {
        self.by_level.get(&level).map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes every `(level, local) -> global` pair ever recorded (births
    /// and aliases alike) as `condensed_multi_summary_local_global_map.bin`.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        stage: &'static str,
        path: &Path,
    ) -> Result<()> {
        for (level, locals) in &self.by_level {
            for (local, global) in locals {
                write_k(writer, *level, stage, path)?;
                write_block_or_singleton(writer, *local as SummaryId, stage, path)?;
                write_block_or_singleton(writer, *global, stage, path)?;
            }
        }
        Ok(())
    }
}

/// A read-only `(level, local) -> global` lookup, reconstructed from
/// `condensed_multi_summary_local_global_map.bin` by a standalone process
/// (e.g. the `quotient` subcommand) that never ran the replay engine.
#[derive(Debug, Default)]
pub struct LocalGlobalMap {
    entries: HashMap<(Level, LocalBlockId), SummaryId>,
}

impl LocalGlobalMap {
    pub fn lookup(&self, level: Level, local: LocalBlockId) -> Option<SummaryId> {
        self.entries.get(&(level, local)).copied()
    }

    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        stage: &'static str,
        path: &Path,
    ) -> Result<Self> {
        let mut entries = HashMap::new();
        let mut at = 0u64;
        loop {
            let level = match read_k(reader, stage, path, RecordIndex(at))? {
                Some(l) => l,
                None => break,
            };
            let local = read_block_or_singleton(reader, stage, path, RecordIndex(at))?.ok_or_else(
                || AssemblerError::TruncatedRecord {
                    stage,
                    path: path.to_path_buf(),
                    at: RecordIndex(at),
                    expected: 5,
                },
            )?;
            let global = read_block_or_singleton(reader, stage, path, RecordIndex(at))?.ok_or_else(
                || AssemblerError::TruncatedRecord {
                    stage,
                    path: path.to_path_buf(),
                    at: RecordIndex(at),
                    expected: 5,
                },
            )?;
            entries.insert((level, local as LocalBlockId), global);
            at += 1;
        }
        Ok(Self { entries })
    }
}
