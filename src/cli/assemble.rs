/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::assembler;
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use log::info;
use std::path::PathBuf;

pub const COMMAND_NAME: &str = "assemble";

#[derive(Args, Debug)]
#[command(about = "Assembles the condensed multi-level summary graph for an experiment.", long_about = None)]
struct CliArgs {
    /// The experiment directory: the parent of `binary_encoding.bin`,
    /// `ad_hoc_results/`, and `bisimulation/`.
    experiment_dir: PathBuf,
}

pub fn cli(command: Command) -> Command {
    command.subcommand(CliArgs::augment_args(Command::new(COMMAND_NAME)))
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;

    let outcome = assembler::assemble(&args.experiment_dir).with_context(|| {
        format!(
            "failed to assemble condensed summary graph for {}",
            args.experiment_dir.display()
        )
    })?;

    info!(
        "assembled {} vertices, {} edges ({} singleton)",
        outcome.store.vertex_count(),
        outcome.store.edge_count(),
        outcome.stats.singleton_count
    );

    assembler::write_artifacts(&args.experiment_dir, &outcome).with_context(|| {
        format!(
            "failed to write condensed summary graph artifacts to {}",
            args.experiment_dir.display()
        )
    })?;

    Ok(())
}
