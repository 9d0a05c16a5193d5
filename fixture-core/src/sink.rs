//! Dataset consumers and row sinks

use crate::error::Result;
use crate::schema::TableMetadata;
use crate::value::Value;

/// Receiver of dataset events
///
/// Events arrive as `start_dataset`, then any number of
/// `start_table`/`row`*/`end_table` brackets, then `end_dataset`.
pub trait DataSetConsumer {
    /// A dataset begins
    fn start_dataset(&mut self) -> Result<()>;

    /// A dataset ends
    fn end_dataset(&mut self) -> Result<()>;

    /// A table begins
    fn start_table(&mut self, metadata: &TableMetadata) -> Result<()>;

    /// The current table ends
    fn end_table(&mut self) -> Result<()>;

    /// One row of the current table, in column order
    fn row(&mut self, values: &[Value]) -> Result<()>;
}

/// Write side of a database, used by
/// [`DatabaseOperation`](crate::operation::DatabaseOperation)
#[cfg_attr(test, mockall::automock)]
pub trait RowSink {
    /// Resolve dataset metadata against the target table
    ///
    /// Sinks that know the real schema return the target's types and primary
    /// key restricted to the dataset columns, in dataset column order.
    fn resolve_metadata(&self, metadata: &TableMetadata) -> Result<TableMetadata> {
        Ok(metadata.clone())
    }

    /// Insert one row
    fn insert_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<()>;

    /// Update the row matching the primary key; returns the rows affected
    fn update_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<usize>;

    /// Delete the row matching the primary key; returns the rows affected
    fn delete_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<usize>;

    /// Whether a row with the same primary key exists
    fn row_exists(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<bool>;

    /// Delete every row of a table
    fn delete_all(&mut self, metadata: &TableMetadata) -> Result<()>;

    /// Truncate a table
    fn truncate(&mut self, metadata: &TableMetadata) -> Result<()>;
}
