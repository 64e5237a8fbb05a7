/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The driver: wires the replay engine, identity allocator, interval
//! bookkeeper, edge folder, and summary-graph store into the full
//! assemble pipeline over an experiment directory.

use crate::edges::{fold_terminal_level, lift_backward, terminal_relation, TripleReader};
use crate::error::{AssemblerError, Result};
use crate::identity::IdentityAllocator;
use crate::ids::Level;
use crate::intervals::IntervalBookkeeper;
use crate::replay::mapping::MappingReader;
use crate::replay::outcome::{self, OutcomeReader};
use crate::replay::{singleton_mapping, LevelTransition, ReplayEngine};
use crate::stats::{level_stats_path, GraphStats, LevelStats, SummaryGraphStats};
use crate::store::SummaryGraphStore;
use crate::util::memory::PeakMemoryTracker;
use crate::util::progress::ProgressLogger;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const STAGE: &str = "assemble";

pub struct AssembleOutcome {
    pub store: SummaryGraphStore,
    pub intervals: IntervalBookkeeper,
    pub identity: IdentityAllocator,
    pub stats: SummaryGraphStats,
    pub transitions: Vec<LevelTransition>,
}

fn graph_stats_path(experiment_dir: &Path) -> PathBuf {
    experiment_dir.join("ad_hoc_results").join("graph_stats.json")
}

/// Logs the solver's own per-level block/singleton counts, if it wrote them.
/// Diagnostic only: hand-written fixtures and older solver runs never
/// produce `statistics_condensed-NNNN.json`, so its absence is silent.
fn log_level_stats(experiment_dir: &Path, level: Level) {
    let path = level_stats_path(experiment_dir, level);
    if let Ok(file) = File::open(&path) {
        match LevelStats::load(file, STAGE, &path) {
            Ok(stats) => info!(
                "level {level}: solver reported {} blocks, {} singletons",
                stats.block_count, stats.singleton_count
            ),
            Err(e) => info!("level {level}: could not parse {}: {e}", path.display()),
        }
    }
}

fn open(path: &Path, stage: &'static str) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssemblerError::InputNotFound {
                stage,
                path: path.to_path_buf(),
            }
        } else {
            AssemblerError::io(stage, path, e)
        }
    })
}

/// Runs the full assemble pipeline over `experiment_dir`, returning the
/// in-memory results; the CLI layer decides what to write to disk.
pub fn assemble(experiment_dir: &Path) -> Result<AssembleOutcome> {
    let started_ms = std::time::Instant::now();

    let stats_path = graph_stats_path(experiment_dir);
    let graph_stats = GraphStats::load(open(&stats_path, STAGE)?, STAGE, &stats_path)?;
    let k = graph_stats.final_depth;
    let total_nodes = graph_stats.vertex_count;
    let fixed_point = graph_stats.fixed_point;

    let level0_path = outcome::path_for(experiment_dir, 0);
    let first_level: Level = if level0_path.exists() { 0 } else { 1 };

    info!(
        "assembling experiment at {}: K={k}, fixed_point={fixed_point}, first_level={first_level}",
        experiment_dir.display()
    );

    let mut identity = IdentityAllocator::new();
    let mut intervals = IntervalBookkeeper::new();
    let mut engine = ReplayEngine::new(total_nodes);
    let mut pl = ProgressLogger::new("level");
    let mut memory = PeakMemoryTracker::new();
    pl.start("replaying partition levels");

    let initial_outcome_path = outcome::path_for(experiment_dir, first_level);
    let initial_outcome = OutcomeReader::new(
        open(&initial_outcome_path, STAGE)?,
        initial_outcome_path.clone(),
    );
    engine.process_initial_level(
        first_level,
        initial_outcome,
        &mut identity,
        &mut intervals,
        &initial_outcome_path,
    )?;
    log_level_stats(experiment_dir, first_level);
    memory.sample();
    pl.update();

    let mut transitions: Vec<LevelTransition> = Vec::new();
    for level in (first_level + 1)..=k {
        let mapping_path = crate::replay::mapping::path_for(experiment_dir, level - 1, level);
        let outcome_path = outcome::path_for(experiment_dir, level);
        let mapping = MappingReader::new(open(&mapping_path, STAGE)?, mapping_path.clone());
        let outcome = OutcomeReader::new(open(&outcome_path, STAGE)?, outcome_path.clone());
        let transition = engine.process_level(
            level,
            mapping,
            outcome,
            &mut identity,
            &mut intervals,
            &mapping_path,
            &outcome_path,
        )?;
        transitions.push(transition);
        log_level_stats(experiment_dir, level);
        memory.sample();
        pl.update();
    }
    pl.done(Some("partition replay complete"));

    intervals.finalize_singleton_deaths(k);

    let mut store = SummaryGraphStore::new();
    let terminal_vertices: Vec<_> = engine
        .node_to_block()
        .values()
        .copied()
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    // A block that survives unchanged all the way to K is never named as a
    // split-parent by any mapping record, so its death would otherwise stay
    // stuck at its birth level; it is implicitly alive through K.
    for &v in &terminal_vertices {
        if v > 0 {
            intervals.set_death(v, k);
        }
    }
    let relation = terminal_relation(
        fixed_point,
        transitions.last(),
        &terminal_vertices,
        0,
        &mut identity,
        &mut intervals,
        &mut store,
    );

    let triples_path = experiment_dir.join("binary_encoding.bin");
    let triples = TripleReader::new(open(&triples_path, STAGE)?, triples_path.clone());
    let mut fold_progress = ProgressLogger::new("triple");
    fold_progress.start("folding terminal-level edges");
    fold_terminal_level(
        triples,
        engine.node_to_block(),
        &relation,
        &mut store,
        &triples_path,
    )?;
    fold_progress.done(Some("terminal-level folding complete"));

    lift_backward(&transitions, &mut store);

    let singleton_count = intervals.iter().filter(|(id, _)| *id < 0).count() as u64;
    // The number of blocks in the ℓ0 outcome, or 1 (the universal block
    // standing in for it) when there is no level-0 outcome at all.
    let initial_partition_size = if first_level == 0 {
        identity.count_at(0) as u64
    } else {
        1
    };

    let stats = SummaryGraphStats {
        vertex_count: store.vertex_count() as u64,
        data_edge_count: store.edge_count() as u64,
        refines_edge_count: transitions.iter().map(|t| t.split_to_merged.len()).sum::<usize>() as u64,
        singleton_count,
        initial_partition_size,
        total_time_ms: started_ms.elapsed().as_millis() as u64,
        max_memory_kb: memory.sample(),
    };

    Ok(AssembleOutcome {
        store,
        intervals,
        identity,
        stats,
        transitions,
    })
}

/// Appends `.tmp` to `path`'s file name, for the write-then-rename dance in
/// [`write_atomic`].
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// No partial output is ever committed: `write_fn` writes to a sibling
/// `.tmp` file, which is renamed onto `final_path` only once every byte is
/// flushed. A crash or I/O error mid-write leaves at most a stray `.tmp`
/// file behind, never a truncated final artifact.
fn write_atomic<F>(final_path: &Path, stage: &'static str, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>, &Path) -> Result<()>,
{
    let tmp_path = tmp_path_for(final_path);
    let file = File::create(&tmp_path).map_err(|e| AssemblerError::io(stage, &tmp_path, e))?;
    let mut w = BufWriter::with_capacity(crate::codec::STREAM_BUFFER_BYTES, file);
    write_fn(&mut w, final_path)?;
    w.flush().map_err(|e| AssemblerError::io(stage, &tmp_path, e))?;
    drop(w);
    std::fs::rename(&tmp_path, final_path).map_err(|e| AssemblerError::io(stage, final_path, e))?;
    Ok(())
}

/// Writes the artifacts named in §6 to `experiment_dir/bisimulation/` and
/// `experiment_dir/ad_hoc_results/`.
pub fn write_artifacts(experiment_dir: &Path, outcome: &AssembleOutcome) -> Result<()> {
    let bisim_dir = experiment_dir.join("bisimulation");
    std::fs::create_dir_all(&bisim_dir).map_err(|e| AssemblerError::io(STAGE, &bisim_dir, e))?;

    let graph_path = bisim_dir.join("condensed_multi_summary_graph.bin");
    write_atomic(&graph_path, STAGE, |w, path| outcome.store.write_to(w, STAGE, path))?;

    let intervals_path = bisim_dir.join("condensed_multi_summary_intervals.bin");
    write_atomic(&intervals_path, STAGE, |w, path| {
        outcome.intervals.write_to(w, STAGE, path)
    })?;

    let map_path = bisim_dir.join("condensed_multi_summary_local_global_map.bin");
    write_atomic(&map_path, STAGE, |w, path| outcome.identity.write_to(w, STAGE, path))?;

    let results_dir = experiment_dir.join("ad_hoc_results");
    std::fs::create_dir_all(&results_dir).map_err(|e| AssemblerError::io(STAGE, &results_dir, e))?;
    let stats_path = results_dir.join("summary_graph_stats.json");
    write_atomic(&stats_path, STAGE, |w, _path| outcome.stats.write_to(w))?;

    write_singleton_mappings(experiment_dir, &outcome.transitions)?;

    Ok(())
}

/// Writes `singleton_mapping-NNNNtoMMMM.bin` for every transition that
/// birthed at least one singleton.
pub fn write_singleton_mappings(experiment_dir: &Path, transitions: &[LevelTransition]) -> Result<()> {
    let bisim_dir = experiment_dir.join("bisimulation");
    std::fs::create_dir_all(&bisim_dir).map_err(|e| AssemblerError::io(STAGE, &bisim_dir, e))?;
    for transition in transitions {
        if transition.new_singletons_by_parent_local.is_empty() {
            continue;
        }
        let records: Vec<_> = transition
            .new_singletons_by_parent_local
            .iter()
            .map(|(parent, nodes)| (*parent, nodes.clone()))
            .collect();
        let path = singleton_mapping::path_for(experiment_dir, transition.level - 1, transition.level);
        write_atomic(&path, STAGE, |w, path| singleton_mapping::write_to(w, &records, STAGE, path))?;
    }
    Ok(())
}
