/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The in-memory summary-graph store: an SPO index with a mirrored reverse
//! (OPS) index, so Phase II lifting can find every edge incident to a dying
//! vertex in O(its incident edges) rather than a full scan.

use crate::codec::block_or_singleton::{read_block_or_singleton, write_block_or_singleton};
use crate::codec::predicate::{read_predicate, write_predicate};
use crate::error::{RecordIndex, Result};
use crate::ids::{PredicateId, SummaryId};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Default)]
pub struct SummaryGraphStore {
    forward: HashMap<SummaryId, HashSet<(PredicateId, SummaryId)>>,
    reverse: HashMap<SummaryId, HashSet<(PredicateId, SummaryId)>>,
    nodes: HashSet<SummaryId>,
}

impl SummaryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vertex with no edges yet, idempotently.
    pub fn add_vertex(&mut self, id: SummaryId) {
        self.nodes.insert(id);
    }

    /// Inserts `(subject, predicate, object)`. A no-op if already present.
    /// Returns `true` if this is a genuinely new edge.
    pub fn insert(&mut self, subject: SummaryId, predicate: PredicateId, object: SummaryId) -> bool {
        self.nodes.insert(subject);
        self.nodes.insert(object);
        let inserted = self
            .forward
            .entry(subject)
            .or_default()
            .insert((predicate, object));
        if inserted {
            self.reverse
                .entry(object)
                .or_default()
                .insert((predicate, subject));
        }
        inserted
    }

    pub fn contains_vertex(&self, id: SummaryId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = SummaryId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|s| s.len()).sum()
    }

    /// Edges where `subject` is the subject: `(predicate, object)` pairs.
    pub fn outgoing(&self, subject: SummaryId) -> impl Iterator<Item = (PredicateId, SummaryId)> + '_ {
        self.forward
            .get(&subject)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Edges where `object` is the object: `(predicate, subject)` pairs.
    pub fn incoming(&self, object: SummaryId) -> impl Iterator<Item = (PredicateId, SummaryId)> + '_ {
        self.reverse
            .get(&object)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn edges(&self) -> impl Iterator<Item = (SummaryId, PredicateId, SummaryId)> + '_ {
        self.forward
            .iter()
            .flat_map(|(s, pairs)| pairs.iter().map(move |(p, o)| (*s, *p, *o)))
    }

    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        stage: &'static str,
        path: &Path,
    ) -> Result<()> {
        for (s, p, o) in self.edges() {
            write_block_or_singleton(writer, s, stage, path)?;
            write_predicate(writer, p, stage, path)?;
            write_block_or_singleton(writer, o, stage, path)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        stage: &'static str,
        path: &Path,
    ) -> Result<Self> {
        let mut store = Self::new();
        let mut at = 0u64;
        loop {
            let s = match read_block_or_singleton(reader, stage, path, RecordIndex(at))? {
                Some(v) => v,
                None => break,
            };
            let p = read_predicate(reader, stage, path, RecordIndex(at))?.ok_or_else(|| {
                crate::error::AssemblerError::TruncatedRecord {
                    stage,
                    path: path.to_path_buf(),
                    at: RecordIndex(at),
                    expected: 4,
                }
            })?;
            let o = read_block_or_singleton(reader, stage, path, RecordIndex(at))?.ok_or_else(
                || crate::error::AssemblerError::TruncatedRecord {
                    stage,
                    path: path.to_path_buf(),
                    at: RecordIndex(at),
                    expected: 5,
                },
            )?;
            store.insert(s, p, o);
            at += 1;
        }
        Ok(store)
    }
}
