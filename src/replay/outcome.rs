/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Streaming reader for `outcome_condensed-NNNN.bin`: `(BLOCK, ENTITY size,
//! ENTITY × size)` records, the authoritative per-level partition.

use crate::codec::block::read_block;
use crate::codec::entity::read_entity;
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::ids::{LocalBlockId, NodeId};
use std::io::Read;
use std::path::{Path, PathBuf};

pub struct OutcomeReader<R> {
    reader: R,
    path: PathBuf,
    at: u64,
}

impl<R: Read> OutcomeReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            at: 0,
        }
    }

    const STAGE: &'static str = "outcome";

    /// Returns the next `(local_block_id, members)` record, or `None` at clean EOF.
    pub fn next_record(&mut self) -> Result<Option<(LocalBlockId, Vec<NodeId>)>> {
        let at = RecordIndex(self.at);
        let block = match read_block(&mut self.reader, Self::STAGE, &self.path, at)? {
            Some(b) => b,
            None => return Ok(None),
        };
        const ENTITY_WIDTH: usize = 5;
        let size = read_entity(&mut self.reader, Self::STAGE, &self.path, at)?.ok_or_else(|| {
            AssemblerError::TruncatedRecord {
                stage: Self::STAGE,
                path: self.path.clone(),
                at,
                expected: ENTITY_WIDTH,
            }
        })?;
        let mut members = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let node = read_entity(&mut self.reader, Self::STAGE, &self.path, at)?.ok_or_else(
                || AssemblerError::TruncatedRecord {
                    stage: Self::STAGE,
                    path: self.path.clone(),
                    at,
                    expected: ENTITY_WIDTH,
                },
            )?;
            members.push(node);
        }
        self.at += 1;
        Ok(Some((block, members)))
    }

    /// Consumes the reader, collecting every remaining record into a vec.
    pub fn read_all(mut self) -> Result<Vec<(LocalBlockId, Vec<NodeId>)>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }
}

pub fn path_for(experiment_dir: &Path, level: crate::ids::Level) -> PathBuf {
    experiment_dir
        .join("bisimulation")
        .join(format!("outcome_condensed-{level:04}.bin"))
}
