/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Derives the quotient graph at an arbitrary level from the serialized
//! condensed artifacts. Walks only `intervals` (already materialized by
//! the assembler) to determine the alive set at any level in O(1) per
//! vertex, rather than replaying every mapping file from level 0; it still
//! re-reads the single level's `mapping-*.bin` / `singleton_mapping-*.bin`
//! pair to build the `refines` relation used to lift subjects one level
//! up. See `DESIGN.md` for the rationale.

use crate::identity::LocalGlobalMap;
use crate::ids::{singleton_id, Level, LocalBlockId, NodeId, PredicateId, SummaryId};
use crate::intervals::IntervalBookkeeper;
use crate::replay::mapping::{MappingReader, SINGLETON_SENTINEL};
use crate::replay::singleton_mapping::SingletonMappingReader;
use crate::store::SummaryGraphStore;
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// The three outputs named in §4.7.
#[derive(Debug, Default)]
pub struct Quotient {
    pub vertices: HashSet<SummaryId>,
    pub edges: Vec<(SummaryId, PredicateId, SummaryId)>,
}

/// Vertices alive at `level`: `birth <= level <= death`.
pub fn alive_at(intervals: &IntervalBookkeeper, level: Level) -> HashSet<SummaryId> {
    intervals
        .iter()
        .filter(|(_, iv)| iv.birth <= level && level <= iv.death)
        .map(|(id, _)| id)
        .collect()
}

/// The fixed-point quotient: every vertex whose interval ends exactly at
/// the fixed-point depth, and every condensed edge between two such vertices.
pub fn at_fixed_point(store: &SummaryGraphStore, intervals: &IntervalBookkeeper, k: Level) -> Quotient {
    let vertices: HashSet<SummaryId> = intervals
        .iter()
        .filter(|(_, iv)| iv.death == k)
        .map(|(id, _)| id)
        .collect();
    let edges = store
        .edges()
        .filter(|(s, _, o)| vertices.contains(s) && vertices.contains(o))
        .collect();
    Quotient { vertices, edges }
}

/// Builds `refines[ℓ+1]`: child summary id born at `ℓ+1` -> parent summary
/// id alive at `ℓ`, by joining `mapping[ℓ→ℓ+1]` and
/// `singleton_mapping[ℓ→ℓ+1]` (if present) against the local→global map.
pub fn build_refines<RM: Read, RS: Read>(
    mapping: Option<MappingReader<RM>>,
    singleton_mapping: Option<SingletonMappingReader<RS>>,
    globals: &LocalGlobalMap,
    level: Level,
) -> crate::error::Result<HashMap<SummaryId, SummaryId>> {
    let mut refines = HashMap::new();
    if let Some(mapping) = mapping {
        for (parent_local, children) in mapping.read_all()? {
            let parent_global = globals.lookup(level, parent_local);
            if let Some(parent_global) = parent_global {
                for child_local in children {
                    if child_local != SINGLETON_SENTINEL {
                        if let Some(child_global) = globals.lookup(level + 1, child_local) {
                            refines.insert(child_global, parent_global);
                        }
                    }
                }
            }
        }
    }
    if let Some(singleton_mapping) = singleton_mapping {
        for (parent_local, nodes) in singleton_mapping.read_all()? {
            if let Some(parent_global) = globals.lookup(level, parent_local) {
                for n in nodes {
                    refines.insert(singleton_id(n), parent_global);
                }
            }
        }
    }
    Ok(refines)
}

/// The general (non-fixed-point) quotient at `level`, per §4.7 item 2.
pub fn at_level(
    store: &SummaryGraphStore,
    intervals: &IntervalBookkeeper,
    refines: &HashMap<SummaryId, SummaryId>,
    level: Level,
) -> Quotient {
    let alive = alive_at(intervals, level);
    let mut edges = Vec::new();
    for (s, p, o) in store.edges() {
        if alive.contains(&s) && alive.contains(&o) {
            edges.push((s, p, o));
            continue;
        }
        if !alive.contains(&o) {
            continue;
        }
        if let Some(&parent) = refines.get(&s) {
            if alive.contains(&parent) {
                edges.push((parent, p, o));
            }
        }
    }
    Quotient {
        vertices: alive,
        edges,
    }
}

/// `contains`: maps every vertex in `vertices` to the original node ids it
/// comprises, by streaming `outcome[0..=level]` and keeping records whose
/// global id (via `globals`) is in `vertices`. Singletons are resolved
/// directly from their id.
pub fn contains(
    vertices: &HashSet<SummaryId>,
    outcome_records: impl IntoIterator<Item = (Level, LocalBlockId, Vec<NodeId>)>,
    globals: &LocalGlobalMap,
) -> HashMap<SummaryId, Vec<NodeId>> {
    let mut out: HashMap<SummaryId, Vec<NodeId>> = HashMap::new();
    for id in vertices.iter().filter(|id| **id < 0) {
        out.insert(*id, vec![crate::ids::node_of_singleton(*id)]);
    }
    for (level, local, members) in outcome_records {
        if let Some(global) = globals.lookup(level, local) {
            if vertices.contains(&global) {
                out.entry(global).or_default().extend(members);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervals::IntervalBookkeeper;

    #[test]
    fn fixed_point_selects_vertices_with_matching_death() {
        let mut intervals = IntervalBookkeeper::new();
        intervals.birth(1, 0);
        intervals.set_death(1, 1);
        intervals.birth(2, 1);
        let mut store = SummaryGraphStore::new();
        store.insert(1, 0, 2);
        let quotient = at_fixed_point(&store, &intervals, 1);
        assert!(quotient.vertices.contains(&1));
        assert!(quotient.vertices.contains(&2));
        assert_eq!(quotient.edges.len(), 1);
    }

    #[test]
    fn contains_joins_outcome_records_through_the_local_global_map_and_resolves_singletons_directly() {
        let mut vertices = HashSet::new();
        vertices.insert(1);
        vertices.insert(singleton_id(9));

        let mut alloc = crate::identity::IdentityAllocator::new();
        let path = std::path::Path::new("test");
        let global = alloc.allocate(0, 3, "test", path).unwrap();
        assert_eq!(global, 1);
        let mut buf = Vec::new();
        alloc.write_to(&mut buf, "test", path).unwrap();
        let mut cur = std::io::Cursor::new(buf);
        let globals = LocalGlobalMap::read_from(&mut cur, "test", path).unwrap();

        // One record for a block not among the quotient's vertices: it must
        // not appear in the result.
        let records = vec![
            (0u16, 3u32, vec![10u64, 11u64]),
            (0u16, 4u32, vec![12u64]),
        ];
        let members = contains(&vertices, records, &globals);

        assert_eq!(members.get(&1), Some(&vec![10, 11]));
        assert_eq!(members.get(&singleton_id(9)), Some(&vec![9]));
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn general_level_lifts_a_freshly_split_subject_through_refines() {
        let mut intervals = IntervalBookkeeper::new();
        intervals.birth(1, 0); // parent P, alive only at level 0
        intervals.set_death(1, 0);
        intervals.birth(10, 0); // object O, stable across levels 0 and 1
        intervals.set_death(10, 5);
        intervals.birth(2, 1); // child C, born at level 1, refines into P

        let mut store = SummaryGraphStore::new();
        store.insert(2, 0, 10); // level-1 edge C --0--> O

        let mut refines = HashMap::new();
        refines.insert(2, 1);

        let quotient = at_level(&store, &intervals, &refines, 0);
        assert!(quotient.vertices.contains(&1));
        assert!(quotient.edges.contains(&(1, 0, 10)));
    }
}
