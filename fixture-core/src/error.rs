//! Error types for fixture datasets

use std::io;
use thiserror::Error;

use crate::compare::Difference;

/// Result type for fixture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fixture operations
#[derive(Error, Debug)]
pub enum Error {
    /// A name is already registered (under the active case policy)
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Table lookup miss
    #[error("No such table: {0}")]
    NoSuchTable(String),

    /// Column lookup miss
    #[error("No such column: {column} (table={table})")]
    NoSuchColumn {
        /// Table that was searched
        table: String,
        /// Column that was not found
        column: String,
    },

    /// Violation of the forward-only / single-pass contract
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Row index past the known or available extent
    #[error("Row {row} out of bounds (table={table}, rows={available})")]
    RowOutOfBounds {
        /// Table being read
        table: String,
        /// Requested row
        row: usize,
        /// Rows that were available when the read failed
        available: usize,
    },

    /// No foreign-key respecting order exists
    #[error("Cyclic dependency between tables: {}", tables.join(", "))]
    CyclicDependency {
        /// Tables taking part in the cycle, in traversal order
        tables: Vec<String>,
    },

    /// A search callback failed
    #[error("Search failed: {0}")]
    Search(#[source] Box<Error>),

    /// One or many differences surfaced through a failure handler
    #[error("{message}")]
    ComparisonFailure {
        /// Rendered message
        message: String,
        /// Rendered expected side
        expected: String,
        /// Rendered actual side
        actual: String,
        /// Differences that caused the failure (empty for structural failures)
        differences: Vec<Difference>,
    },

    /// A value could not be coerced into a data type
    #[error("Cannot cast '{value}' to {data_type}")]
    TypeCast {
        /// Rendered source value
        value: String,
        /// Target data type name
        data_type: String,
    },

    /// Operation needs a primary key the table does not declare
    #[error("Table {0} has no primary key")]
    NoPrimaryKey(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by an external collaborator (driver, format reader)
    #[error("External error: {0}")]
    External(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create an unsupported-operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// Create a no-such-column error
    pub fn no_such_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::NoSuchColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Wrap a collaborator failure
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::External(Box::new(err))
    }

    /// Check whether this is a forward-only contract violation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }

    /// Check whether this is an out-of-bounds read
    pub fn is_row_out_of_bounds(&self) -> bool {
        matches!(self, Error::RowOutOfBounds { .. })
    }

    /// Differences carried by a comparison failure
    pub fn differences(&self) -> &[Difference] {
        match self {
            Error::ComparisonFailure { differences, .. } => differences,
            _ => &[],
        }
    }
}
