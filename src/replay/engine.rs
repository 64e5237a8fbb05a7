/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Drives the per-level replay: applies `mapping[ℓ-1→ℓ]` then `outcome[ℓ]`
//! in ascending level order, maintaining `node_to_block` and handing the
//! identity allocator / interval bookkeeper every birth and death it
//! observes. Produces one [`LevelTransition`] per level boundary, which the
//! edge folder later walks backward during Phase II lifting.

use super::mapping::{dissolves_into_singletons, MappingReader, SINGLETON_SENTINEL};
use super::outcome::OutcomeReader;
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::identity::IdentityAllocator;
use crate::ids::{singleton_id, Level, LocalBlockId, NodeId, SummaryId};
use crate::intervals::IntervalBookkeeper;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

const STAGE: &str = "replay";

/// Everything the edge folder needs to lift summary edges from level `level`
/// back to `level - 1`.
#[derive(Debug, Default)]
pub struct LevelTransition {
    pub level: Level,
    /// Child summary id (alive at `level`) -> parent summary id (alive at
    /// `level - 1`). A vertex absent from this map survived unchanged and
    /// maps to itself.
    pub split_to_merged: HashMap<SummaryId, SummaryId>,
    /// Parent summary id (at `level - 1`) -> nodes that became singletons
    /// when that parent split, for `singleton_mapping-*.bin`.
    pub new_singletons_by_parent: HashMap<SummaryId, Vec<NodeId>>,
    /// The same split, keyed by the parent's *local* id at `level - 1`
    /// instead of its global id — the form `singleton_mapping-*.bin`
    /// actually serializes.
    pub new_singletons_by_parent_local: HashMap<LocalBlockId, Vec<NodeId>>,
}

pub struct ReplayEngine {
    node_to_block: HashMap<NodeId, SummaryId>,
    block_members: HashMap<LocalBlockId, Vec<NodeId>>,
    current_level: Option<Level>,
    total_nodes: NodeId,
}

impl ReplayEngine {
    /// `total_nodes` seeds every node as its own singleton; the first
    /// outcome read overwrites the ones that actually belong to a block.
    pub fn new(total_nodes: NodeId) -> Self {
        let mut node_to_block = HashMap::with_capacity(total_nodes as usize);
        for n in 0..total_nodes {
            node_to_block.insert(n, singleton_id(n));
        }
        Self {
            node_to_block,
            block_members: HashMap::new(),
            current_level: None,
            total_nodes,
        }
    }

    pub fn node_to_block(&self) -> &HashMap<NodeId, SummaryId> {
        &self.node_to_block
    }

    pub fn current_level(&self) -> Option<Level> {
        self.current_level
    }

    /// Processes `ℓ₀`: no mapping file precedes it, every record is a birth.
    pub fn process_initial_level<R: Read>(
        &mut self,
        level: Level,
        mut outcome: OutcomeReader<R>,
        identity: &mut IdentityAllocator,
        intervals: &mut IntervalBookkeeper,
        outcome_path: &Path,
    ) -> Result<()> {
        let mut block_members = HashMap::new();
        while let Some((local, members)) = outcome.next_record()? {
            let global = identity.allocate(level, local, STAGE, outcome_path)?;
            intervals.birth(global, level);
            for &n in &members {
                self.node_to_block.insert(n, global);
            }
            block_members.insert(local, members);
        }
        self.block_members = block_members;
        self.current_level = Some(level);

        for n in 0..self.total_nodes {
            let sid = singleton_id(n);
            if self.node_to_block.get(&n) == Some(&sid) {
                intervals.birth(sid, level);
            }
        }
        Ok(())
    }

    /// Processes the transition into level `level` (`= ℓ-1 + 1`).
    pub fn process_level<RM: Read, RO: Read>(
        &mut self,
        level: Level,
        mapping: MappingReader<RM>,
        mut outcome: OutcomeReader<RO>,
        identity: &mut IdentityAllocator,
        intervals: &mut IntervalBookkeeper,
        mapping_path: &Path,
        outcome_path: &Path,
    ) -> Result<LevelTransition> {
        let prev_level = self.current_level.ok_or_else(|| {
            AssemblerError::invariant(
                STAGE,
                outcome_path,
                RecordIndex(0),
                "process_level called before the initial level was replayed",
            )
        })?;

        let records = mapping.read_all()?;

        let mut parent_globals: HashMap<LocalBlockId, SummaryId> = HashMap::new();
        let mut child_parent: HashMap<LocalBlockId, LocalBlockId> = HashMap::new();
        for (parent_local, children) in &records {
            let parent_global = identity.lookup(prev_level, *parent_local).ok_or_else(|| {
                AssemblerError::invariant(
                    STAGE,
                    mapping_path,
                    RecordIndex(*parent_local as u64),
                    format!(
                        "mapping refers to parent block {parent_local} not present in the level {prev_level} outcome"
                    ),
                )
            })?;
            intervals.set_death(parent_global, prev_level);
            parent_globals.insert(*parent_local, parent_global);
            for &child in children {
                if child != SINGLETON_SENTINEL {
                    child_parent.insert(child, *parent_local);
                }
            }
        }

        let prev_block_members = std::mem::take(&mut self.block_members);
        let mut block_members = HashMap::new();
        let mut split_to_merged = HashMap::new();

        while let Some((local, members)) = outcome.next_record()? {
            let global = if let Some(parent_local) = child_parent.get(&local) {
                let parent_global = parent_globals[parent_local];
                let global = identity.allocate(level, local, STAGE, outcome_path)?;
                intervals.birth(global, level);
                split_to_merged.insert(global, parent_global);
                global
            } else {
                let global = identity.lookup(prev_level, local).ok_or_else(|| {
                    AssemblerError::invariant(
                        STAGE,
                        outcome_path,
                        RecordIndex(local as u64),
                        format!(
                            "block {local} appears unchanged at level {level} but had no identity at level {prev_level}"
                        ),
                    )
                })?;
                identity.alias(level, local, global);
                global
            };
            for &n in &members {
                self.node_to_block.insert(n, global);
            }
            block_members.insert(local, members);
        }
        self.block_members = block_members;

        let mut new_singletons_by_parent: HashMap<SummaryId, Vec<NodeId>> = HashMap::new();
        let mut new_singletons_by_parent_local: HashMap<LocalBlockId, Vec<NodeId>> = HashMap::new();
        for (parent_local, children) in &records {
            let parent_global = parent_globals[parent_local];
            let before: HashSet<NodeId> = prev_block_members
                .get(parent_local)
                .map(|m| m.iter().copied().collect())
                .unwrap_or_default();
            let mut after: HashSet<NodeId> = HashSet::new();
            if !dissolves_into_singletons(children) {
                for &child in children {
                    if child == SINGLETON_SENTINEL {
                        continue;
                    }
                    if let Some(members) = self.block_members.get(&child) {
                        after.extend(members.iter().copied());
                    }
                }
            }
            let mut new_singles: Vec<NodeId> = before.difference(&after).copied().collect();
            new_singles.sort_unstable();
            for &n in &new_singles {
                let sid = singleton_id(n);
                self.node_to_block.insert(n, sid);
                intervals.birth(sid, level);
                split_to_merged.insert(sid, parent_global);
            }
            if !new_singles.is_empty() {
                new_singletons_by_parent
                    .entry(parent_global)
                    .or_default()
                    .extend(new_singles.clone());
                new_singletons_by_parent_local
                    .entry(*parent_local)
                    .or_default()
                    .extend(new_singles);
            }
        }

        self.current_level = Some(level);
        Ok(LevelTransition {
            level,
            split_to_merged,
            new_singletons_by_parent,
            new_singletons_by_parent_local,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::block::write_block;
    use crate::codec::entity::write_entity;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test")
    }

    fn outcome_bytes(records: &[(u32, &[u64])]) -> Vec<u8> {
        let p = path();
        let mut buf = Vec::new();
        for (block, members) in records {
            write_block(&mut buf, *block, "test", &p).unwrap();
            write_entity(&mut buf, members.len() as u64, "test", &p).unwrap();
            for m in *members {
                write_entity(&mut buf, *m, "test", &p).unwrap();
            }
        }
        buf
    }

    fn mapping_bytes(records: &[(u32, &[u32])]) -> Vec<u8> {
        let p = path();
        let mut buf = Vec::new();
        for (parent, children) in records {
            write_block(&mut buf, *parent, "test", &p).unwrap();
            write_block(&mut buf, children.len() as u32, "test", &p).unwrap();
            for c in *children {
                write_block(&mut buf, *c, "test", &p).unwrap();
            }
        }
        buf
    }

    #[test]
    fn s3_single_split_produces_singleton_and_surviving_block() {
        // Level 0: block B = {0,1,2}. Level 1: C = {0,1}, node 2 becomes a singleton.
        let mut engine = ReplayEngine::new(3);
        let mut identity = IdentityAllocator::new();
        let mut intervals = IntervalBookkeeper::new();

        let outcome0 = OutcomeReader::new(
            Cursor::new(outcome_bytes(&[(1, &[0, 1, 2])])),
            "outcome0",
        );
        engine
            .process_initial_level(0, outcome0, &mut identity, &mut intervals, &path())
            .unwrap();
        let b_global = identity.lookup(0, 1).unwrap();

        let mapping = MappingReader::new(Cursor::new(mapping_bytes(&[(1, &[2])])), "mapping");
        let outcome1 = OutcomeReader::new(Cursor::new(outcome_bytes(&[(2, &[0, 1])])), "outcome1");
        let transition = engine
            .process_level(1, mapping, outcome1, &mut identity, &mut intervals, &path(), &path())
            .unwrap();

        let c_global = identity.lookup(1, 2).unwrap();
        assert_eq!(engine.node_to_block()[&0], c_global);
        assert_eq!(engine.node_to_block()[&1], c_global);
        assert_eq!(engine.node_to_block()[&2], singleton_id(2));

        assert_eq!(transition.split_to_merged[&c_global], b_global);
        assert_eq!(transition.split_to_merged[&singleton_id(2)], b_global);
        assert_eq!(intervals.get(b_global).unwrap().death, 0);
        assert_eq!(intervals.get(c_global).unwrap().birth, 1);
        assert_eq!(intervals.get(singleton_id(2)).unwrap().birth, 1);
    }

    #[test]
    fn unchanged_block_keeps_its_global_id() {
        let mut engine = ReplayEngine::new(2);
        let mut identity = IdentityAllocator::new();
        let mut intervals = IntervalBookkeeper::new();

        let outcome0 = OutcomeReader::new(Cursor::new(outcome_bytes(&[(1, &[0, 1])])), "outcome0");
        engine
            .process_initial_level(0, outcome0, &mut identity, &mut intervals, &path())
            .unwrap();
        let global0 = identity.lookup(0, 1).unwrap();

        // No mapping record at all for block 1: it survives unchanged.
        let mapping = MappingReader::new(Cursor::new(mapping_bytes(&[])), "mapping");
        let outcome1 = OutcomeReader::new(Cursor::new(outcome_bytes(&[(1, &[0, 1])])), "outcome1");
        let transition = engine
            .process_level(1, mapping, outcome1, &mut identity, &mut intervals, &path(), &path())
            .unwrap();

        let global1 = identity.lookup(1, 1).unwrap();
        assert_eq!(global0, global1);
        assert!(transition.split_to_merged.is_empty());
        assert_eq!(intervals.get(global0).unwrap().death, 0); // not yet extended
    }

    #[test]
    fn full_dissolution_turns_every_member_into_a_singleton() {
        let mut engine = ReplayEngine::new(2);
        let mut identity = IdentityAllocator::new();
        let mut intervals = IntervalBookkeeper::new();

        let outcome0 = OutcomeReader::new(Cursor::new(outcome_bytes(&[(1, &[0, 1])])), "outcome0");
        engine
            .process_initial_level(0, outcome0, &mut identity, &mut intervals, &path())
            .unwrap();

        let mapping = MappingReader::new(Cursor::new(mapping_bytes(&[(1, &[0])])), "mapping");
        let outcome1 = OutcomeReader::new(Cursor::new(outcome_bytes(&[])), "outcome1");
        let transition = engine
            .process_level(1, mapping, outcome1, &mut identity, &mut intervals, &path(), &path())
            .unwrap();

        assert_eq!(engine.node_to_block()[&0], singleton_id(0));
        assert_eq!(engine.node_to_block()[&1], singleton_id(1));
        assert_eq!(transition.new_singletons_by_parent.len(), 1);
    }
}
