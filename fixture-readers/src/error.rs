//! Error types for fixture readers

use thiserror::Error;

/// Error type for fixture readers
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] fixture_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV format error
    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON format error
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed fixture file
    #[error("Format error: {0}")]
    Format(String),
}

/// Result type for fixture readers
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for fixture_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(e) => e,
            Error::Io(e) => fixture_core::Error::Io(e),
            #[cfg(feature = "json")]
            Error::Json(e) => fixture_core::Error::Json(e),
            other => fixture_core::Error::external(other),
        }
    }
}
