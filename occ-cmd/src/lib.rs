//! Command implementations for OCC CLI.
//!
//! Renders one fill-percentage chart per station for the bike-share
//! stations and the car parks, and lists the capacity tables in use.

use clap::{Args, Subcommand};
use log::info;
use std::path::PathBuf;

pub mod capacities;
pub mod pipeline;
pub mod report;

use pipeline::{Pipeline, PipelineConfig, PipelineKind};
use report::PipelineReport;

/// Overrides applied on top of a pipeline's defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Directory of `{station}.json` reading files
    #[arg(short = 'd', long)]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving the PNG charts (created if missing)
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// CSV of `NAME,CAPACITY` replacing the built-in capacity table
    #[arg(short = 'c', long)]
    pub capacities: Option<PathBuf>,

    /// Chart stations missing from the capacity table with capacity 1 instead of skipping them
    #[arg(long)]
    pub keep_unknown: bool,

    /// Stop at the first station that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl PipelineArgs {
    pub fn config(&self, kind: PipelineKind) -> anyhow::Result<PipelineConfig> {
        let mut config = PipelineConfig::for_kind(kind)?;
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        if self.capacities.is_some() {
            config.capacities = capacities::load_capacities(kind, self.capacities.as_deref())?;
        }
        config.skip_if_no_capacity = !self.keep_unknown;
        config.fail_fast = self.fail_fast;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Chart bike availability per station (data-velos -> plots_velos)
    Bikes(PipelineArgs),

    /// Chart car-park occupancy per station (data-voitures -> plots_voitures)
    Cars(PipelineArgs),

    /// Run the bike then the car pipeline with default directories
    All {
        /// Chart stations missing from the capacity tables with capacity 1
        #[arg(long)]
        keep_unknown: bool,

        /// Stop at the first station that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the capacity table of a pipeline as CSV
    Capacities {
        #[arg(value_enum)]
        pipeline: PipelineKind,

        /// Print this CSV file instead of the built-in table
        #[arg(short = 'c', long)]
        capacities: Option<PathBuf>,
    },
}

/// Run one pipeline, print its completion lines and write the optional summary.
pub fn run_pipeline(kind: PipelineKind, args: &PipelineArgs) -> anyhow::Result<PipelineReport> {
    let config = args.config(kind)?;
    let report = Pipeline::new(config).run()?;
    info!(
        "{} pipeline done: {} rendered, {} without capacity, {} empty, {} failed, {} entries dropped",
        kind,
        report.rendered.len(),
        report.missing_capacity.len(),
        report.empty.len(),
        report.failed.len(),
        report.dropped_entries
    );
    report.print_completion();
    if let Some(path) = &args.summary_json {
        report.write_summary_json(path)?;
        info!("Summary written to {}", path.display());
    }
    Ok(report)
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Bikes(args) => run_pipeline(PipelineKind::Bikes, &args).map(|_| ()),
        Command::Cars(args) => run_pipeline(PipelineKind::Cars, &args).map(|_| ()),
        Command::All {
            keep_unknown,
            fail_fast,
        } => {
            let args = PipelineArgs {
                keep_unknown,
                fail_fast,
                ..PipelineArgs::default()
            };
            run_pipeline(PipelineKind::Bikes, &args)?;
            run_pipeline(PipelineKind::Cars, &args)?;
            Ok(())
        }
        Command::Capacities {
            pipeline,
            capacities,
        } => capacities::run_capacities(pipeline, capacities.as_deref()),
    }
}
