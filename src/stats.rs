/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! JSON I/O for `graph_stats.json` (input) and `summary_graph_stats.json`
//! (output), plus the per-level solver statistics consumed only for logging.

use crate::error::{AssemblerError, Result};
use crate::ids::Level;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

/// The fields of `ad_hoc_results/graph_stats.json` this crate depends on.
/// Tolerant of extra fields the solver may also write.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphStats {
    #[serde(rename = "Final depth")]
    pub final_depth: Level,
    #[serde(rename = "Vertex count")]
    pub vertex_count: u64,
    #[serde(rename = "Fixed point")]
    pub fixed_point: bool,
}

impl GraphStats {
    pub fn load<R: Read>(reader: R, stage: &'static str, path: &Path) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| AssemblerError::MalformedJson {
            stage,
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Per-level `ad_hoc_results/statistics_condensed-NNNN.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelStats {
    #[serde(rename = "Block count")]
    pub block_count: u64,
    #[serde(rename = "Singleton count")]
    pub singleton_count: u64,
}

impl LevelStats {
    pub fn load<R: Read>(reader: R, stage: &'static str, path: &Path) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| AssemblerError::MalformedJson {
            stage,
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

pub fn level_stats_path(experiment_dir: &Path, level: Level) -> PathBuf {
    experiment_dir
        .join("ad_hoc_results")
        .join(format!("statistics_condensed-{level:04}.json"))
}

/// `ad_hoc_results/summary_graph_stats.json`, written once at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryGraphStats {
    #[serde(rename = "Vertex count")]
    pub vertex_count: u64,
    #[serde(rename = "Data edge count")]
    pub data_edge_count: u64,
    #[serde(rename = "Refines edge count")]
    pub refines_edge_count: u64,
    #[serde(rename = "Singleton count")]
    pub singleton_count: u64,
    #[serde(rename = "Initial partition size")]
    pub initial_partition_size: u64,
    #[serde(rename = "Total time taken (ms)")]
    pub total_time_ms: u64,
    #[serde(rename = "Maximum memory footprint (kB)")]
    pub max_memory_kb: u64,
}

impl SummaryGraphStats {
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| AssemblerError::MalformedJson {
            stage: "stats",
            path: Path::new("summary_graph_stats.json").to_path_buf(),
            detail: e.to_string(),
        })
    }
}
