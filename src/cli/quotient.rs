/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::identity::LocalGlobalMap;
use crate::ids::{is_singleton, node_of_singleton, Level, LocalBlockId, NodeId, PredicateId, SummaryId};
use crate::intervals::IntervalBookkeeper;
use crate::names::NameTable;
use crate::quotient::{self, Quotient};
use crate::replay::mapping::{self, MappingReader};
use crate::replay::outcome::{self, OutcomeReader};
use crate::replay::singleton_mapping::{self, SingletonMappingReader};
use crate::stats::GraphStats;
use crate::store::SummaryGraphStore;
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

pub const COMMAND_NAME: &str = "quotient";

#[derive(Args, Debug)]
#[command(about = "Extracts the quotient graph at a given level, or at the fixed point.", long_about = None)]
struct CliArgs {
    /// The experiment directory holding the condensed artifacts.
    experiment_dir: PathBuf,
    /// Extract the quotient at this partition level instead of the fixed point.
    #[arg(long)]
    level: Option<Level>,
    /// Extract the fixed-point quotient (the default if `--level` is omitted).
    #[arg(long)]
    fixed_point: bool,
    /// Resolve entity/predicate ids to their original names via
    /// `entity2ID.txt` / `rel2ID.txt`, falling back to the numeric id when
    /// a mapping is unavailable.
    #[arg(long)]
    names: bool,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    Vertex { id: SummaryId, label: String },
    Edge { subject: String, predicate: String, object: String },
    Contains { vertex: String, members: Vec<String> },
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("could not open {}", path.display()))
}

fn bisim_dir(experiment_dir: &Path) -> PathBuf {
    experiment_dir.join("bisimulation")
}

fn vertex_label(
    id: SummaryId,
    node_names: Option<&NameTable<u64>>,
) -> String {
    if is_singleton(id) {
        crate::names::node_name(node_names, node_of_singleton(id))
    } else if id == 0 {
        "*".to_string()
    } else {
        id.to_string()
    }
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    let bisim = bisim_dir(&args.experiment_dir);

    let graph_path = bisim.join("condensed_multi_summary_graph.bin");
    let mut r = BufReader::new(open(&graph_path)?);
    let store = SummaryGraphStore::read_from(&mut r, "quotient", &graph_path)
        .with_context(|| format!("could not parse {}", graph_path.display()))?;

    let intervals_path = bisim.join("condensed_multi_summary_intervals.bin");
    let mut r = BufReader::new(open(&intervals_path)?);
    let intervals = IntervalBookkeeper::read_from(&mut r, "quotient", &intervals_path)
        .with_context(|| format!("could not parse {}", intervals_path.display()))?;

    let stats_path = args.experiment_dir.join("ad_hoc_results").join("graph_stats.json");
    let graph_stats = GraphStats::load(open(&stats_path)?, "quotient", &stats_path)?;

    let map_path = bisim.join("condensed_multi_summary_local_global_map.bin");
    let mut r = BufReader::new(open(&map_path)?);
    let globals = LocalGlobalMap::read_from(&mut r, "quotient", &map_path)
        .with_context(|| format!("could not parse {}", map_path.display()))?;

    let target_level = if args.level.is_none() || args.fixed_point {
        graph_stats.final_depth
    } else {
        args.level.unwrap()
    };

    let quotient = if args.level.is_none() || args.fixed_point {
        quotient::at_fixed_point(&store, &intervals, graph_stats.final_depth)
    } else {
        let mapping_path = mapping::path_for(&args.experiment_dir, target_level, target_level + 1);
        let mapping_reader = File::open(&mapping_path)
            .ok()
            .map(|f| MappingReader::new(f, mapping_path.clone()));
        let singleton_mapping_path =
            singleton_mapping::path_for(&args.experiment_dir, target_level, target_level + 1);
        let singleton_mapping_reader = File::open(&singleton_mapping_path)
            .ok()
            .map(|f| SingletonMappingReader::new(f, singleton_mapping_path.clone()));

        let refines = quotient::build_refines(mapping_reader, singleton_mapping_reader, &globals, target_level)
            .with_context(|| format!("could not build the refinement relation for level {target_level}"))?;

        quotient::at_level(&store, &intervals, &refines, target_level)
    };

    let mut outcome_records: Vec<(Level, LocalBlockId, Vec<NodeId>)> = Vec::new();
    for level in 0..=target_level {
        let outcome_path = outcome::path_for(&args.experiment_dir, level);
        if let Ok(file) = File::open(&outcome_path) {
            let reader = OutcomeReader::new(file, outcome_path.clone());
            for (local, members) in reader
                .read_all()
                .with_context(|| format!("could not parse {}", outcome_path.display()))?
            {
                outcome_records.push((level, local, members));
            }
        }
    }
    let contains = quotient::contains(&quotient.vertices, outcome_records, &globals);

    let node_names = if args.names {
        let path = args.experiment_dir.join("entity2ID.txt");
        File::open(&path)
            .ok()
            .map(|f| NameTable::<u64>::load(f, "quotient", &path))
            .transpose()?
    } else {
        None
    };
    let predicate_names = if args.names {
        let path = args.experiment_dir.join("rel2ID.txt");
        File::open(&path)
            .ok()
            .map(|f| NameTable::<PredicateId>::load(f, "quotient", &path))
            .transpose()?
    } else {
        None
    };

    emit(&quotient, &contains, node_names.as_ref(), predicate_names.as_ref())
}

fn emit(
    quotient: &Quotient,
    contains: &HashMap<SummaryId, Vec<NodeId>>,
    node_names: Option<&NameTable<u64>>,
    predicate_names: Option<&NameTable<PredicateId>>,
) -> Result<()> {
    use itertools::Itertools;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for v in quotient.vertices.iter().sorted() {
        let record = Record::Vertex {
            id: *v,
            label: vertex_label(*v, node_names),
        };
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    for &(s, p, o) in quotient.edges.iter().sorted() {
        let predicate = predicate_names
            .and_then(|t| t.name_of(p))
            .map(|s| s.to_string())
            .unwrap_or_else(|| p.to_string());
        let record = Record::Edge {
            subject: vertex_label(s, node_names),
            predicate,
            object: vertex_label(o, node_names),
        };
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    for v in quotient.vertices.iter().sorted() {
        if let Some(members) = contains.get(v) {
            let mut names: Vec<String> = members
                .iter()
                .map(|&n| crate::names::node_name(node_names, n))
                .collect();
            names.sort();
            let record = Record::Contains {
                vertex: vertex_label(*v, node_names),
                members: names,
            };
            writeln!(out, "{}", serde_json::to_string(&record)?)?;
        }
    }
    Ok(())
}
