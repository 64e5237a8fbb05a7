/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Phase I (terminal-level folding) and Phase II (backward lifting) of the
//! edge folder: §4.5 of the design. Phase I maps every raw triple's
//! endpoints to their terminal-level summary ids as-is; Phase II then walks
//! the replay's level transitions backward — including the terminal one —
//! lifting each level's edges into the level below via the store's reverse
//! index, so a terminal-level edge is demoted to K-1 by the very same
//! mechanism that demotes every other level, rather than a second time in
//! Phase I. The one case Phase I must still handle itself is when there is
//! no level-0 outcome at all: then there is no transition for Phase II to
//! lift through, so Phase I folds every terminal vertex directly onto a
//! synthesized universal vertex.

use super::triples::{Triple, TripleReader};
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::identity::IdentityAllocator;
use crate::ids::{Level, NodeId, SummaryId};
use crate::intervals::IntervalBookkeeper;
use crate::replay::LevelTransition;
use crate::store::SummaryGraphStore;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const STAGE: &str = "edges";

/// Builds the relation every terminal-level summary vertex is folded
/// through before Phase I inserts an edge. Identity (an empty map) whenever
/// a transition into the terminal level exists — Phase II's backward lift
/// (over the *full* transition list, terminal one included) already
/// reproduces the K-to-K-1 demotion in that case, so folding again in
/// Phase I would double it. The one case Phase II cannot cover is when
/// there is no level-0 outcome at all, so no transition exists for the
/// terminal level to lift through: if the solver additionally never
/// reached a fixed point, Phase I folds every terminal vertex onto a
/// synthesized universal vertex standing in for the missing level 0.
pub fn terminal_relation(
    fixed_point_reached: bool,
    last_transition: Option<&LevelTransition>,
    terminal_vertices: &[SummaryId],
    level0: Level,
    identity: &mut IdentityAllocator,
    intervals: &mut IntervalBookkeeper,
    store: &mut SummaryGraphStore,
) -> HashMap<SummaryId, SummaryId> {
    if last_transition.is_some() || fixed_point_reached {
        return HashMap::new();
    }
    // Immediate stop with no level-0 outcome and no fixed point: synthesize
    // a universal vertex regardless of how many terminal blocks survived,
    // since there is no level-0 partition for them to refine into otherwise.
    let universal = identity.universal();
    store.add_vertex(universal);
    intervals.birth(universal, level0);
    terminal_vertices
        .iter()
        .map(|&v| (v, universal))
        .collect()
}

/// Phase I: streams the raw triples once, mapping both endpoints through
/// `node_to_block` and then, for the object only, through `terminal_relation`.
///
/// Only the object is folded: a forward-bisimulation summary vertex's
/// identity is defined by the summary classes of its out-neighbors one
/// level down, so when there is no real level-0 partition for the object
/// to belong to, its out-neighbor reference is replaced by the stand-in
/// universal vertex while the subject keeps its own terminal-level
/// identity. In every other case `relation` is empty and this is a no-op.
pub fn fold_terminal_level<R: Read>(
    mut triples: TripleReader<R>,
    node_to_block: &HashMap<NodeId, SummaryId>,
    relation: &HashMap<SummaryId, SummaryId>,
    store: &mut SummaryGraphStore,
    path: &Path,
) -> Result<()> {
    let mut at = 0u64;
    while let Some(triple) = triples.next_triple()? {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;
        let s = node_to_block
            .get(&subject)
            .copied()
            .ok_or_else(|| missing_node(subject, at, path))?;
        let o = node_to_block
            .get(&object)
            .copied()
            .ok_or_else(|| missing_node(object, at, path))?;
        let o = relation.get(&o).copied().unwrap_or(o);
        store.insert(s, predicate, o);
        at += 1;
    }
    Ok(())
}

fn missing_node(node: NodeId, at: u64, path: &Path) -> AssemblerError {
    AssemblerError::invariant(
        STAGE,
        path,
        RecordIndex(at),
        format!("triple references node {node} with no recorded block assignment"),
    )
}

/// Phase II: walks `transitions` from the terminal level back to `ℓ0+1`,
/// lifting each dying vertex's incident edges onto its parent.
pub fn lift_backward(transitions: &[LevelTransition], store: &mut SummaryGraphStore) {
    for transition in transitions.iter().rev() {
        let mut new_edges = Vec::new();
        for (&child, &parent) in &transition.split_to_merged {
            for (predicate, subject) in store.incoming(child) {
                let subject_image = transition
                    .split_to_merged
                    .get(&subject)
                    .copied()
                    .unwrap_or(subject);
                new_edges.push((subject_image, predicate, parent));
            }
            for (predicate, object) in store.outgoing(child) {
                let object_image = transition
                    .split_to_merged
                    .get(&object)
                    .copied()
                    .unwrap_or(object);
                new_edges.push((parent, predicate, object_image));
            }
        }
        for (s, p, o) in new_edges {
            store.insert(s, p, o);
        }
    }
}
