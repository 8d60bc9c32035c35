//! PNG line charts of station fill percentages.
//!
//! One chart per station: time on x with day labels and 6-hour gridlines,
//! percentage on a fixed 0-100 y axis.

pub mod render;
pub mod style;

use std::path::PathBuf;
use thiserror::Error;

pub use render::{chart_path, render_station_chart};
pub use style::{ChartLabels, ChartStyle};

/// Errors raised while rendering a chart
#[derive(Error, Debug)]
pub enum ChartError {
    /// Nothing to plot
    #[error("No readings to plot for {0}")]
    NoData(String),

    /// Timestamps and percentages differ in length
    #[error("Misaligned series for {station}: {timestamps} timestamps, {percentages} percentages")]
    Misaligned {
        station: String,
        timestamps: usize,
        percentages: usize,
    },

    /// The drawing backend failed
    #[error("Failed to draw {path}: {message}")]
    Draw { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ChartError>;
