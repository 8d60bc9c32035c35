use crate::timeseries::Timeseries;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How a raw reading turns into a fill percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillFormula {
    /// Share of docks holding an available bike (bike stations).
    Availability,
    /// Share of parking spaces taken (car parks). NaN when capacity <= 0.
    Occupancy,
}

/// Percentage of dock capacity holding available bikes, clamped to [0, 100].
pub fn availability_percent(available: f64, capacity: f64) -> f64 {
    (available / capacity * 100.0).clamp(0.0, 100.0)
}

/// Percentage of parking spaces taken, clamped to [0, 100].
///
/// A lot without capacity has no meaningful occupancy: the result is NaN,
/// never a clamped bound.
pub fn occupancy_percent(available: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        return f64::NAN;
    }
    ((capacity - available) / capacity * 100.0).clamp(0.0, 100.0)
}

impl FillFormula {
    pub fn compute(&self, value: f64, capacity: i32) -> f64 {
        let capacity = f64::from(capacity);
        match self {
            FillFormula::Availability => availability_percent(value, capacity),
            FillFormula::Occupancy => occupancy_percent(value, capacity),
        }
    }
}

/// Fill percentages aligned 1:1 with the readings of a [`Timeseries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSeries {
    pub station: String,
    pub capacity: i32,
    pub timestamps: Vec<NaiveDateTime>,
    pub percentages: Vec<f64>,
}

impl FillSeries {
    pub fn compute(series: &Timeseries, capacity: i32, formula: FillFormula) -> FillSeries {
        let percentages = series
            .values
            .iter()
            .map(|value| formula.compute(*value, capacity))
            .collect();
        FillSeries {
            station: series.station.clone(),
            capacity,
            timestamps: series.timestamps.clone(),
            percentages,
        }
    }

    pub fn len(&self) -> usize {
        self.percentages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }
}
