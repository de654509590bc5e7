//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Malformed or missing file structure.
    #[error("invalid file format: {0}")]
    Format(String),

    /// Malformed line in a text file; line numbers are 1-based.
    #[error("invalid file format at line {line}: {reason}")]
    FormatAtLine { line: usize, reason: String },

    /// Invalid mode or flag combination; raised before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] microcirc_core::Error),
}
