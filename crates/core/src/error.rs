//! Error types for avasus

use thiserror::Error;

/// Main error type for avasus operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    /// Rasters entering a cell-by-cell operation are not on the same grid.
    #[error("Raster alignment mismatch: {0}")]
    Alignment(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// The raster/vector store could not read or write an entry.
    #[error("Store error at '{path}': {reason}")]
    Store { path: String, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a store failure at `path`
    pub fn store(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::Store {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for avasus operations
pub type Result<T> = std::result::Result<T, Error>;
