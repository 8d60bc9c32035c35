use crate::error::{Result, StationError};
use chrono::NaiveDateTime;
use log::debug;
use occ_utils::dates::parse_timestamp;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A single occupancy reading: available bikes or free parking spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Chronologically ordered readings of one station.
///
/// `timestamps` and `values` are aligned index by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    pub station: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
    /// Entries dropped because the key or the value did not parse
    pub dropped: usize,
}

/// Station name of a data file: its stem, e.g. `data-velos/Corum.json` -> `Corum`.
pub fn station_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// Coerce a JSON reading to f64.
///
/// Numbers, numeric strings and booleans are accepted; anything else is
/// rejected so the entry gets dropped. Strings such as `"nan"` or `"inf"`
/// parse as floats but are not readings.
fn reading_value(value: &Value) -> Option<f64> {
    let value = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

impl Timeseries {
    /// Load a station file, naming the station after the file stem.
    pub fn load(path: &Path) -> Result<Timeseries> {
        let station = station_name(path).unwrap_or_default();
        let text = std::fs::read_to_string(path).map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Timeseries::parse(station, &text, path)
    }

    /// Build a timeseries from JSON text already in memory.
    pub fn from_json_str(station: &str, text: &str) -> Result<Timeseries> {
        Timeseries::parse(station.to_string(), text, &PathBuf::from(station))
    }

    fn parse(station: String, text: &str, origin: &Path) -> Result<Timeseries> {
        let raw: Value = serde_json::from_str(text).map_err(|source| StationError::Json {
            path: origin.to_path_buf(),
            source,
        })?;
        let Value::Object(entries) = raw else {
            return Err(StationError::NotAnObject(origin.to_path_buf()));
        };

        let total = entries.len();
        let mut readings = entries
            .iter()
            .filter_map(|(key, value)| {
                let timestamp = parse_timestamp(key).ok()?;
                let value = reading_value(value)?;
                Some(Reading { timestamp, value })
            })
            .collect::<Vec<Reading>>();
        let dropped = total - readings.len();
        if dropped > 0 {
            debug!("{}: dropped {} of {} entries", station, dropped, total);
        }

        readings.sort_by_key(|reading| reading.timestamp);
        let (timestamps, values) = readings
            .into_iter()
            .map(|reading| (reading.timestamp, reading.value))
            .unzip();
        Ok(Timeseries {
            station,
            timestamps,
            values,
            dropped,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn readings(&self) -> impl Iterator<Item = Reading> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .map(|(timestamp, value)| Reading {
                timestamp: *timestamp,
                value: *value,
            })
    }
}
