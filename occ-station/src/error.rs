/// Error types for the station library
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for station data operations
#[derive(Error, Debug)]
pub enum StationError {
    /// Station file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Station file is not valid JSON
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level JSON value is not a timestamp -> reading object
    #[error("Expected a JSON object of timestamp -> reading in {0}")]
    NotAnObject(PathBuf),

    /// Failed to parse capacity CSV data
    #[error("Failed to parse capacity CSV: {0}")]
    CapacityCsv(#[from] csv::Error),

    /// Capacity row with a blank name or non-integer capacity
    #[error("Invalid capacity row {row}: {reason}")]
    InvalidCapacity { row: usize, reason: String },

    /// Same station listed twice in a capacity table
    #[error("Station listed twice in capacity table: {0}")]
    DuplicateStation(String),

    /// Availability percentages need a positive capacity
    #[error("Station {station} has non-positive capacity {capacity}")]
    NonPositiveCapacity { station: String, capacity: i32 },
}

/// Type alias for Results using StationError
pub type Result<T> = std::result::Result<T, StationError>;
