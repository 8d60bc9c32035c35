//! Core types for bike-share and car-park occupancy data.
//!
//! A station is a name shared by two sources: a [`capacity::CapacityTable`]
//! entry and a JSON file of readings loaded into a [`timeseries::Timeseries`].
//! [`fill::FillSeries`] joins the two into percentages ready for charting.

pub mod capacity;
pub mod error;
pub mod fill;
pub mod timeseries;
