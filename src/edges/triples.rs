/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Streaming reader for `binary_encoding.bin`: a flat concatenation of
//! `⟨ENTITY subject, PREDICATE, ENTITY object⟩` triples.

use crate::codec::entity::read_entity;
use crate::codec::predicate::read_predicate;
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::ids::{NodeId, PredicateId};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub subject: NodeId,
    pub predicate: PredicateId,
    pub object: NodeId,
}

pub struct TripleReader<R> {
    reader: R,
    path: PathBuf,
    at: u64,
}

impl<R: Read> TripleReader<R> {
    const STAGE: &'static str = "edges";

    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            at: 0,
        }
    }

    pub fn next_triple(&mut self) -> Result<Option<Triple>> {
        let at = RecordIndex(self.at);
        let subject = match read_entity(&mut self.reader, Self::STAGE, &self.path, at)? {
            Some(s) => s,
            None => return Ok(None),
        };
        let predicate = read_predicate(&mut self.reader, Self::STAGE, &self.path, at)?
            .ok_or_else(|| AssemblerError::TruncatedRecord {
                stage: Self::STAGE,
                path: self.path.clone(),
                at,
                expected: 4,
            })?;
        let object = read_entity(&mut self.reader, Self::STAGE, &self.path, at)?.ok_or_else(
            || AssemblerError::TruncatedRecord {
                stage: Self::STAGE,
                path: self.path.clone(),
                at,
                expected: 5,
            },
        )?;
        self.at += 1;
        Ok(Some(Triple {
            subject,
            predicate,
            object,
        }))
    }
}

impl<R: Read> Iterator for TripleReader<R> {
    type Item = Result<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_triple().transpose()
    }
}
