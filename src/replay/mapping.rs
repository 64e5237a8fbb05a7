/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Streaming reader for `mapping-NNNNtoMMMM.bin`: `(BLOCK parent, BLOCK
//! child_count, BLOCK × child_count)` records. A child of `0` is the
//! singleton-extraction sentinel, not a real block id.

use crate::codec::block::read_block;
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::ids::{Level, LocalBlockId};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Sentinel child id meaning "one or more singletons were extracted here".
pub const SINGLETON_SENTINEL: LocalBlockId = 0;

pub struct MappingReader<R> {
    reader: R,
    path: PathBuf,
    at: u64,
}

impl<R: Read> MappingReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            at: 0,
        }
    }

    const STAGE: &'static str = "mapping";

    /// Returns the next `(parent_local_id, children)` record, or `None` at clean EOF.
    /// `children` may contain `SINGLETON_SENTINEL` marking singleton extraction.
    pub fn next_record(&mut self) -> Result<Option<(LocalBlockId, Vec<LocalBlockId>)>> {
        let at = RecordIndex(self.at);
        let parent = match read_block(&mut self.reader, Self::STAGE, &self.path, at)? {
            Some(p) => p,
            None => return Ok(None),
        };
        const BLOCK_WIDTH: usize = 4;
        let count = read_block(&mut self.reader, Self::STAGE, &self.path, at)?.ok_or_else(
            || AssemblerError::TruncatedRecord {
                stage: Self::STAGE,
                path: self.path.clone(),
                at,
                expected: BLOCK_WIDTH,
            },
        )?;
        let mut children = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let child = read_block(&mut self.reader, Self::STAGE, &self.path, at)?.ok_or_else(
                || AssemblerError::TruncatedRecord {
                    stage: Self::STAGE,
                    path: self.path.clone(),
                    at,
                    expected: BLOCK_WIDTH,
                },
            )?;
            children.push(child);
        }
        self.at += 1;
        Ok(Some((parent, children)))
    }

    pub fn read_all(mut self) -> Result<Vec<(LocalBlockId, Vec<LocalBlockId>)>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }
}

pub fn path_for(experiment_dir: &Path, from: Level, to: Level) -> PathBuf {
    experiment_dir
        .join("bisimulation")
        .join(format!("mapping-{from:04}to{to:04}.bin"))
}

/// A record's children dissolve the parent entirely into singletons iff its
/// only child is the sentinel.
pub fn dissolves_into_singletons(children: &[LocalBlockId]) -> bool {
    children.len() == 1 && children[0] == SINGLETON_SENTINEL
}
