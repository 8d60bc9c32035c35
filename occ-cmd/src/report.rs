//! Outcome of a pipeline run and its JSON summary.

use crate::pipeline::PipelineKind;
use anyhow::Context;
use occ_station::fill::FillSeries;
use occ_utils::dates::format_timestamp;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

/// A station whose processing failed, with the rendered error chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationFailure {
    pub station: String,
    pub error: String,
}

/// Result of one pipeline run. Station lists are in processing order.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub pipeline: PipelineKind,
    /// Absolute path of the chart directory
    pub output_dir: PathBuf,
    pub rendered: Vec<String>,
    /// Stations without a capacity table entry, skipped or not
    pub missing_capacity: Vec<String>,
    /// Stations whose file held no valid reading
    pub empty: Vec<String>,
    pub failed: Vec<StationFailure>,
    /// Entries dropped by the loader across all stations
    pub dropped_entries: usize,
    pub series: BTreeMap<String, FillSeries>,
}

/// Per-station statistics derived from a rendered fill series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub capacity: i32,
    pub points: usize,
    pub first: Option<String>,
    pub last: Option<String>,
    /// Statistics over finite percentages; `None` when there are none
    pub min_fill: Option<f64>,
    pub max_fill: Option<f64>,
    pub mean_fill: Option<f64>,
}

impl StationSummary {
    pub fn from_series(series: &FillSeries) -> StationSummary {
        let finite: Vec<f64> = series
            .percentages
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .collect();
        let (min_fill, max_fill, mean_fill) = if finite.is_empty() {
            (None, None, None)
        } else {
            let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = finite.iter().sum::<f64>() / finite.len() as f64;
            (Some(min), Some(max), Some(mean))
        };
        StationSummary {
            station: series.station.clone(),
            capacity: series.capacity,
            points: series.len(),
            first: series.timestamps.first().map(format_timestamp),
            last: series.timestamps.last().map(format_timestamp),
            min_fill,
            max_fill,
            mean_fill,
        }
    }
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    pipeline: PipelineKind,
    output_dir: &'a Path,
    rendered: &'a [String],
    missing_capacity: &'a [String],
    empty: &'a [String],
    failed: &'a [StationFailure],
    dropped_entries: usize,
    stations: Vec<StationSummary>,
}

impl PipelineReport {
    pub fn new(pipeline: PipelineKind, output_dir: PathBuf) -> Self {
        PipelineReport {
            pipeline,
            output_dir,
            rendered: Vec::new(),
            missing_capacity: Vec::new(),
            empty: Vec::new(),
            failed: Vec::new(),
            dropped_entries: 0,
            series: BTreeMap::new(),
        }
    }

    /// One summary per rendered station, ordered by station name.
    pub fn summaries(&self) -> Vec<StationSummary> {
        self.series.values().map(StationSummary::from_series).collect()
    }

    /// Console lines closing a run: the output directory, then any
    /// stations that were skipped or failed.
    pub fn completion_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "OK. Graphes exportés dans: {}",
            self.output_dir.display()
        )];
        if !self.missing_capacity.is_empty() {
            lines.push(format!(
                "Stations sans capacité connue ({}): {}",
                self.missing_capacity.len(),
                self.missing_capacity.join(", ")
            ));
        }
        for failure in &self.failed {
            lines.push(format!("Échec {}: {}", failure.station, failure.error));
        }
        lines
    }

    pub fn print_completion(&self) {
        for line in self.completion_lines() {
            println!("{line}");
        }
    }

    pub fn write_summary_json(&self, path: &Path) -> anyhow::Result<()> {
        let document = SummaryDocument {
            pipeline: self.pipeline,
            output_dir: &self.output_dir,
            rendered: &self.rendered,
            missing_capacity: &self.missing_capacity,
            empty: &self.empty,
            failed: &self.failed,
            dropped_entries: self.dropped_entries,
            stations: self.summaries(),
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &document)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        Ok(())
    }
}
