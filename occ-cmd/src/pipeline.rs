//! Generic station pipeline: discover files, resolve capacity, load, compute, render.
//!
//! Bikes and cars run the same driver; they only differ by their
//! [`PipelineConfig`].

use crate::report::{PipelineReport, StationFailure};
use anyhow::Context;
use clap::ValueEnum;
use log::{error, info, warn};
use occ_chart::{chart_path, render_station_chart, ChartLabels, ChartStyle};
use occ_station::{
    capacity::CapacityTable,
    error::StationError,
    fill::{FillFormula, FillSeries},
    timeseries::{station_name, Timeseries},
};
use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

pub const BIKES_DATA_DIR: &str = "data-velos";
pub const BIKES_OUT_DIR: &str = "plots_velos";
pub const BIKES_SUFFIX: &str = "velos_dispo_pct";

pub const CARS_DATA_DIR: &str = "data-voitures";
pub const CARS_OUT_DIR: &str = "plots_voitures";
pub const CARS_SUFFIX: &str = "places_prises_pct";

/// Capacity used for unknown stations when they are not skipped.
pub const FALLBACK_CAPACITY: i32 = 1;

/// Extension of station reading files.
const DATA_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Bikes,
    Cars,
}

impl PipelineKind {
    /// Built-in capacity table of this pipeline.
    pub fn capacities(&self) -> anyhow::Result<CapacityTable> {
        let table = match self {
            PipelineKind::Bikes => CapacityTable::bikes(),
            PipelineKind::Cars => CapacityTable::cars(),
        };
        table.with_context(|| format!("built-in {self} capacity table"))
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Bikes => write!(f, "bikes"),
            PipelineKind::Cars => write!(f, "cars"),
        }
    }
}

/// Everything a pipeline run needs. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub kind: PipelineKind,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub capacities: CapacityTable,
    pub formula: FillFormula,
    pub labels: ChartLabels,
    pub chart_style: ChartStyle,
    /// Chart file suffix: `{station}_{output_suffix}.png`
    pub output_suffix: String,
    /// Skip stations missing from `capacities`; otherwise use `fallback_capacity`
    pub skip_if_no_capacity: bool,
    pub fallback_capacity: i32,
    /// Abort the run on the first station error instead of recording it
    pub fail_fast: bool,
}

impl PipelineConfig {
    /// Bike-share availability charts.
    pub fn bikes() -> anyhow::Result<PipelineConfig> {
        Ok(PipelineConfig {
            kind: PipelineKind::Bikes,
            data_dir: PathBuf::from(BIKES_DATA_DIR),
            out_dir: PathBuf::from(BIKES_OUT_DIR),
            capacities: PipelineKind::Bikes.capacities()?,
            formula: FillFormula::Availability,
            labels: ChartLabels::bikes(),
            chart_style: ChartStyle::default(),
            output_suffix: BIKES_SUFFIX.to_string(),
            skip_if_no_capacity: true,
            fallback_capacity: FALLBACK_CAPACITY,
            fail_fast: false,
        })
    }

    /// Car-park occupancy charts.
    pub fn cars() -> anyhow::Result<PipelineConfig> {
        Ok(PipelineConfig {
            kind: PipelineKind::Cars,
            data_dir: PathBuf::from(CARS_DATA_DIR),
            out_dir: PathBuf::from(CARS_OUT_DIR),
            capacities: PipelineKind::Cars.capacities()?,
            formula: FillFormula::Occupancy,
            labels: ChartLabels::cars(),
            chart_style: ChartStyle::default(),
            output_suffix: CARS_SUFFIX.to_string(),
            skip_if_no_capacity: true,
            fallback_capacity: FALLBACK_CAPACITY,
            fail_fast: false,
        })
    }

    pub fn for_kind(kind: PipelineKind) -> anyhow::Result<PipelineConfig> {
        match kind {
            PipelineKind::Bikes => PipelineConfig::bikes(),
            PipelineKind::Cars => PipelineConfig::cars(),
        }
    }
}

/// What happened to a station that got past capacity resolution.
#[derive(Debug)]
enum StationOutcome {
    Rendered { series: FillSeries, dropped: usize },
    Empty { dropped: usize },
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    /// `*.json` files of the data directory, sorted by name.
    pub fn station_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let data_dir = &self.config.data_dir;
        let mut files = Vec::new();
        let entries = std::fs::read_dir(data_dir)
            .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list {}", data_dir.display()))?
                .path();
            let is_data_file = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == DATA_EXTENSION);
            if is_data_file {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every station file once, in name order.
    ///
    /// Station-level failures are recorded in the report unless
    /// `fail_fast` is set. Errors returned here concern the whole run.
    pub fn run(&self) -> anyhow::Result<PipelineReport> {
        let config = &self.config;
        std::fs::create_dir_all(&config.out_dir).with_context(|| {
            format!("Failed to create output directory {}", config.out_dir.display())
        })?;
        let out_dir = std::fs::canonicalize(&config.out_dir)
            .with_context(|| format!("Failed to resolve {}", config.out_dir.display()))?;
        let files = self.station_files()?;
        info!(
            "{} pipeline: {} station files in {}",
            config.kind,
            files.len(),
            config.data_dir.display()
        );

        let mut report = PipelineReport::new(config.kind, out_dir.clone());
        for path in files {
            let Some(station) = station_name(&path) else {
                warn!("Skipping {}: no usable station name", path.display());
                continue;
            };

            let capacity = match config.capacities.lookup(&station) {
                Some(capacity) => capacity,
                None => {
                    report.missing_capacity.push(station.clone());
                    if config.skip_if_no_capacity {
                        warn!("No capacity for {}, skipped", station);
                        continue;
                    }
                    warn!(
                        "No capacity for {}, using fallback capacity {}",
                        station, config.fallback_capacity
                    );
                    config.fallback_capacity
                }
            };

            match self.process_station(&path, &station, capacity, &out_dir) {
                Ok(StationOutcome::Rendered { series, dropped }) => {
                    report.dropped_entries += dropped;
                    report.rendered.push(station.clone());
                    report.series.insert(station, series);
                }
                Ok(StationOutcome::Empty { dropped }) => {
                    warn!("{} has no valid readings, no chart written", station);
                    report.dropped_entries += dropped;
                    report.empty.push(station);
                }
                Err(err) => {
                    if config.fail_fast {
                        return Err(err.context(format!("Station {station} failed")));
                    }
                    error!("Station {} failed: {:#}", station, err);
                    report.failed.push(StationFailure {
                        station,
                        error: format!("{err:#}"),
                    });
                }
            }
        }
        Ok(report)
    }

    fn process_station(
        &self,
        path: &Path,
        station: &str,
        capacity: i32,
        out_dir: &Path,
    ) -> anyhow::Result<StationOutcome> {
        let config = &self.config;
        if config.formula == FillFormula::Availability && capacity <= 0 {
            return Err(StationError::NonPositiveCapacity {
                station: station.to_string(),
                capacity,
            }
            .into());
        }

        let timeseries = Timeseries::load(path)?;
        let dropped = timeseries.dropped;
        if timeseries.is_empty() {
            return Ok(StationOutcome::Empty { dropped });
        }

        let series = FillSeries::compute(&timeseries, capacity, config.formula);
        let target = chart_path(out_dir, station, &config.output_suffix);
        render_station_chart(
            &target,
            station,
            &series.timestamps,
            &series.percentages,
            &config.labels,
            &config.chart_style,
        )?;
        info!(
            "{}: {} readings ({} dropped) -> {}",
            station,
            series.len(),
            dropped,
            target.display()
        );
        Ok(StationOutcome::Rendered { series, dropped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        data_dir: PathBuf,
        out_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Fixture {
            let root = tempfile::tempdir().unwrap();
            let data_dir = root.path().join("data");
            let out_dir = root.path().join("plots");
            std::fs::create_dir_all(&data_dir).unwrap();
            Fixture {
                _root: root,
                data_dir,
                out_dir,
            }
        }

        fn station(&self, name: &str, json: &str) -> &Self {
            std::fs::write(self.data_dir.join(format!("{name}.json")), json).unwrap();
            self
        }

        fn config(&self, kind: PipelineKind, capacities: &str) -> PipelineConfig {
            let mut config = PipelineConfig::for_kind(kind).unwrap();
            config.data_dir = self.data_dir.clone();
            config.out_dir = self.out_dir.clone();
            config.capacities = CapacityTable::parse_capacity_csv(capacities).unwrap();
            config
        }
    }

    const TEST_DOCK: &str =
        r#"{"2024-06-01 00:00": 0, "2024-06-01 06:00": 5, "2024-06-01 12:00": 10}"#;

    #[test]
    fn test_bikes_end_to_end() {
        let fixture = Fixture::new();
        fixture.station("TestDock", TEST_DOCK);
        let config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\nTestDock,10\n");
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.rendered, vec!["TestDock"]);
        assert_eq!(report.series["TestDock"].percentages, vec![0.0, 50.0, 100.0]);
        assert!(fixture.out_dir.join("TestDock_velos_dispo_pct.png").is_file());
        assert!(report.output_dir.is_absolute());
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_cars_polarity_and_suffix() {
        let fixture = Fixture::new();
        fixture.station("Gare", TEST_DOCK);
        let config = fixture.config(PipelineKind::Cars, "NAME,CAPACITY\nGare,10\n");
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.series["Gare"].percentages, vec![100.0, 50.0, 0.0]);
        assert!(fixture.out_dir.join("Gare_places_prises_pct.png").is_file());
    }

    #[test]
    fn test_cars_zero_capacity_renders_gaps() {
        let fixture = Fixture::new();
        fixture.station("Closed", TEST_DOCK);
        let config = fixture.config(PipelineKind::Cars, "NAME,CAPACITY\nClosed,0\n");
        let report = Pipeline::new(config).run().unwrap();

        assert!(report.series["Closed"].percentages.iter().all(|p| p.is_nan()));
        assert!(fixture.out_dir.join("Closed_places_prises_pct.png").is_file());
    }

    #[test]
    fn test_bikes_zero_capacity_fails_station_only() {
        let fixture = Fixture::new();
        fixture.station("Closed", TEST_DOCK).station("TestDock", TEST_DOCK);
        let config = fixture.config(
            PipelineKind::Bikes,
            "NAME,CAPACITY\nClosed,0\nTestDock,10\n",
        );
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.rendered, vec!["TestDock"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].station, "Closed");
        assert!(report.failed[0].error.contains("non-positive capacity"));
    }

    #[test]
    fn test_unknown_station_skipped() {
        let fixture = Fixture::new();
        fixture.station("Mystery", TEST_DOCK).station("TestDock", TEST_DOCK);
        let config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\nTestDock,10\n");
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.missing_capacity, vec!["Mystery"]);
        assert_eq!(report.rendered, vec!["TestDock"]);
        assert!(!fixture.out_dir.join("Mystery_velos_dispo_pct.png").exists());
    }

    #[test]
    fn test_unknown_station_fallback_capacity() {
        let fixture = Fixture::new();
        fixture.station("Mystery", r#"{"2024-06-01 00:00": 0, "2024-06-01 06:00": 3}"#);
        let mut config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\nTestDock,10\n");
        config.skip_if_no_capacity = false;
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.missing_capacity, vec!["Mystery"]);
        assert_eq!(report.series["Mystery"].capacity, FALLBACK_CAPACITY);
        assert_eq!(report.series["Mystery"].percentages, vec![0.0, 100.0]);
        assert!(fixture.out_dir.join("Mystery_velos_dispo_pct.png").is_file());
    }

    #[test]
    fn test_malformed_file_isolated() {
        let fixture = Fixture::new();
        fixture
            .station("Broken", "{ not json")
            .station("TestDock", TEST_DOCK);
        let config = fixture.config(
            PipelineKind::Bikes,
            "NAME,CAPACITY\nBroken,8\nTestDock,10\n",
        );
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.rendered, vec!["TestDock"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].station, "Broken");
    }

    #[test]
    fn test_malformed_file_fail_fast() {
        let fixture = Fixture::new();
        fixture
            .station("Broken", "{ not json")
            .station("TestDock", TEST_DOCK);
        let mut config = fixture.config(
            PipelineKind::Bikes,
            "NAME,CAPACITY\nBroken,8\nTestDock,10\n",
        );
        config.fail_fast = true;
        let err = Pipeline::new(config).run().unwrap_err();
        assert!(format!("{err:#}").contains("Broken"));
        // "Broken" sorts first, so nothing was rendered
        assert!(!fixture.out_dir.join("TestDock_velos_dispo_pct.png").exists());
    }

    #[test]
    fn test_empty_station_recorded() {
        let fixture = Fixture::new();
        fixture.station("TestDock", r#"{"bad-key": 1, "2024-06-01 00:00": "oops"}"#);
        let config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\nTestDock,10\n");
        let report = Pipeline::new(config).run().unwrap();

        assert_eq!(report.empty, vec!["TestDock"]);
        assert_eq!(report.dropped_entries, 2);
        assert!(report.rendered.is_empty());
        assert!(!fixture.out_dir.join("TestDock_velos_dispo_pct.png").exists());
    }

    #[test]
    fn test_station_files_sorted_and_filtered() {
        let fixture = Fixture::new();
        fixture
            .station("Voltaire", "{}")
            .station("Antigone centre", "{}")
            .station("Corum", "{}");
        std::fs::write(fixture.data_dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(fixture.data_dir.join("Upper.JSON"), "{}").unwrap();
        std::fs::create_dir(fixture.data_dir.join("nested.json")).unwrap();
        let config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\n");
        let files = Pipeline::new(config).station_files().unwrap();
        let names: Vec<String> = files.iter().filter_map(|p| station_name(p)).collect();
        assert_eq!(names, vec!["Antigone centre", "Corum", "Voltaire"]);
    }

    #[test]
    fn test_missing_data_dir_is_fatal() {
        let fixture = Fixture::new();
        let mut config = fixture.config(PipelineKind::Cars, "NAME,CAPACITY\n");
        config.data_dir = fixture.data_dir.join("absent");
        assert!(Pipeline::new(config).run().is_err());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let fixture = Fixture::new();
        fixture
            .station("TestDock", TEST_DOCK)
            .station("Mystery", TEST_DOCK);
        let config = fixture.config(PipelineKind::Bikes, "NAME,CAPACITY\nTestDock,10\n");
        let pipeline = Pipeline::new(config);
        let chart = fixture.out_dir.join("TestDock_velos_dispo_pct.png");

        let first = pipeline.run().unwrap();
        let first_bytes = std::fs::read(&chart).unwrap();
        let second = pipeline.run().unwrap();
        let second_bytes = std::fs::read(&chart).unwrap();

        assert_eq!(first.rendered, second.rendered);
        assert_eq!(first.missing_capacity, second.missing_capacity);
        assert_eq!(first.series, second.series);
        assert_eq!(first_bytes, second_bytes);
    }
}
