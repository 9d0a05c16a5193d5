use std::sync::Mutex;

use super::{Table, TableRef};
use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::value::Value;

/// Forward-only view over another table
///
/// Enforces the streaming contract on any table: the row count is hidden
/// and rows may only be read in non-decreasing order.
pub struct ForwardOnlyTable {
    inner: TableRef,
    last_row: Mutex<Option<usize>>,
}

impl ForwardOnlyTable {
    /// Wrap `inner`
    pub fn new(inner: TableRef) -> Self {
        Self {
            inner,
            last_row: Mutex::new(None),
        }
    }
}

impl Table for ForwardOnlyTable {
    fn metadata(&self) -> &TableMetadata {
        self.inner.metadata()
    }

    fn row_count(&self) -> Result<usize> {
        Err(Error::unsupported(format!(
            "row count of forward-only table {} is not available",
            self.inner.name()
        )))
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        let mut last_row = self
            .last_row
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(last) = *last_row {
            if row < last {
                return Err(Error::unsupported(format!(
                    "cannot go backward in table {}: row {row} requested after row {last}",
                    self.inner.name()
                )));
            }
        }
        let value = self.inner.value(row, column)?;
        *last_row = Some(row);
        Ok(value)
    }
}
