//! Tables backed by an open row cursor

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{DefaultTable, Table};
use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::source::RowCursor;
use crate::value::Value;

/// Read every row of `cursor` into a [`DefaultTable`] and close it
///
/// The cursor is closed on success and on failure.
pub fn load_cursor(mut cursor: Box<dyn RowCursor>) -> Result<DefaultTable> {
    let mut table = DefaultTable::new(cursor.metadata().clone());

    let loaded = loop {
        match cursor.next_row() {
            Ok(Some(values)) => {
                if let Err(e) = table.add_row(values) {
                    break Err(e);
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let closed = cursor.close();
    loaded?;
    closed?;
    debug!(table = %table.name(), rows = table.rows().len(), "loaded table from cursor");
    Ok(table)
}

struct CursorState {
    cursor: Option<Box<dyn RowCursor>>,
    /// Index and values of the row under the cursor
    current: Option<(usize, Vec<Value>)>,
    /// Rows fetched so far
    fetched: usize,
    exhausted: bool,
}

impl CursorState {
    fn close(&mut self) -> Result<()> {
        match self.cursor.take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        }
    }
}

/// A forward-only table reading rows straight from a cursor
///
/// Rows must be requested in non-decreasing order; any number of columns
/// can be read from the current row. Reading past the last row closes the
/// cursor and fails with [`Error::RowOutOfBounds`]. The row count is never
/// known in advance.
pub struct StreamingTable {
    metadata: TableMetadata,
    state: Mutex<CursorState>,
}

impl StreamingTable {
    /// Wrap an open cursor
    pub fn new(cursor: Box<dyn RowCursor>) -> Self {
        Self {
            metadata: cursor.metadata().clone(),
            state: Mutex::new(CursorState {
                cursor: Some(cursor),
                current: None,
                fetched: 0,
                exhausted: false,
            }),
        }
    }

    /// Close the underlying cursor; closing twice is a no-op
    pub fn close(&self) -> Result<()> {
        self.lock().close()
    }

    /// Whether the cursor has been released
    pub fn is_closed(&self) -> bool {
        self.lock().cursor.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, CursorState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn out_of_bounds(&self, row: usize, available: usize) -> Error {
        Error::RowOutOfBounds {
            table: self.metadata.table_name().to_string(),
            row,
            available,
        }
    }
}

impl Table for StreamingTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn row_count(&self) -> Result<usize> {
        Err(Error::unsupported(format!(
            "row count of streaming table {} is not known",
            self.metadata.table_name()
        )))
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        let index = self.metadata.column_index(column)?;
        let mut state = self.lock();

        if let Some((current, _)) = &state.current {
            if row < *current {
                return Err(Error::unsupported(format!(
                    "cannot go backward in table {}: row {row} requested after row {current}",
                    self.metadata.table_name()
                )));
            }
        }

        while state
            .current
            .as_ref()
            .map_or(true, |(current, _)| *current < row)
        {
            if state.exhausted {
                return Err(self.out_of_bounds(row, state.fetched));
            }
            let Some(cursor) = state.cursor.as_mut() else {
                return Err(Error::unsupported(format!(
                    "streaming table {} is closed",
                    self.metadata.table_name()
                )));
            };

            match cursor.next_row() {
                Ok(Some(values)) => {
                    let position = state.fetched;
                    state.fetched += 1;
                    state.current = Some((position, values));
                }
                Ok(None) => {
                    state.exhausted = true;
                    state.close()?;
                    debug!(
                        table = %self.metadata.table_name(),
                        rows = state.fetched,
                        "cursor exhausted"
                    );
                    return Err(self.out_of_bounds(row, state.fetched));
                }
                Err(e) => {
                    if let Err(close_err) = state.close() {
                        warn!(error = %close_err, "failed to close cursor after read error");
                    }
                    return Err(e);
                }
            }
        }

        match &state.current {
            Some((_, values)) => values
                .get(index)
                .cloned()
                .ok_or_else(|| Error::InvalidArgument(format!(
                    "cursor for {} returned a short row",
                    self.metadata.table_name()
                ))),
            None => Err(self.out_of_bounds(row, state.fetched)),
        }
    }
}

impl Drop for StreamingTable {
    fn drop(&mut self) {
        if let Err(e) = self.lock().close() {
            warn!(table = %self.metadata.table_name(), error = %e, "failed to close cursor");
        }
    }
}
