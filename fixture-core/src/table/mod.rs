//! Tables: named grids of typed columns and positional rows
//!
//! A [`Table`] is read cell by cell through [`Table::value`]. Materialized
//! tables ([`DefaultTable`]) answer any row in any order; streaming tables
//! ([`StreamingTable`], [`ForwardOnlyTable`]) only move forward and do not
//! know their row count up front. Code that must work with both kinds reads
//! rows through [`for_each_row`] / [`read_row`], which sweep forward once.

mod column_filter;
mod composite;
mod forward_only;
mod replacement;
mod sorted;
mod streaming;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::value::Value;

pub use column_filter::{ColumnFilter, ColumnFilterTable};
pub use composite::CompositeTable;
pub use forward_only::ForwardOnlyTable;
pub use replacement::{ReplacementTable, Replacements};
pub use sorted::{SortMode, SortedTable};
pub use streaming::{load_cursor, StreamingTable};

/// A table of rows and named columns
pub trait Table: Send + Sync {
    /// Metadata describing the columns of this table
    fn metadata(&self) -> &TableMetadata;

    /// Number of rows
    ///
    /// Forward-only tables fail with [`Error::Unsupported`].
    fn row_count(&self) -> Result<usize>;

    /// Value at `row` (zero-based) in the named column
    fn value(&self, row: usize, column: &str) -> Result<Value>;

    /// Table name, as recorded in the metadata
    fn name(&self) -> &str {
        self.metadata().table_name()
    }
}

/// Shared handle to a table
pub type TableRef = Arc<dyn Table>;

/// Row count, or `None` for tables that cannot know it in advance
pub fn row_count_if_known(table: &dyn Table) -> Result<Option<usize>> {
    match table.row_count() {
        Ok(count) => Ok(Some(count)),
        Err(Error::Unsupported(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read one full row in column order
///
/// Returns `None` when the table has no row at `row`. Only the first column
/// read may hit the end of data; a later out-of-bounds read is an error.
pub fn read_row(table: &dyn Table, row: usize) -> Result<Option<Vec<Value>>> {
    let metadata = table.metadata();
    if metadata.column_count() == 0 {
        return Ok(None);
    }

    let mut values = Vec::with_capacity(metadata.column_count());
    for column in metadata.columns() {
        match table.value(row, &column.name) {
            Ok(value) => values.push(value),
            Err(e) if e.is_row_out_of_bounds() && values.is_empty() => return Ok(None),
            Err(e) => return Err(e),
        }
    }
    Ok(Some(values))
}

/// Visit every row once, in order, and return the number of rows visited
pub fn for_each_row<F>(table: &dyn Table, mut visit: F) -> Result<usize>
where
    F: FnMut(usize, Vec<Value>) -> Result<()>,
{
    let known = row_count_if_known(table)?;
    let mut row = 0;
    loop {
        if known.is_some_and(|count| row >= count) {
            break;
        }
        match read_row(table, row)? {
            Some(values) => visit(row, values)?,
            None => break,
        }
        row += 1;
    }
    Ok(row)
}

/// An in-memory table
#[derive(Debug, Clone)]
pub struct DefaultTable {
    metadata: TableMetadata,
    rows: Vec<Vec<Value>>,
}

impl DefaultTable {
    /// Create an empty table
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            rows: Vec::new(),
        }
    }

    /// Create a table from rows given in column order
    pub fn with_rows(metadata: TableMetadata, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(metadata);
        table.rows.reserve(rows.len());
        for row in rows {
            table.add_row(row)?;
        }
        Ok(table)
    }

    /// Materialize any table, sweeping it forward once
    pub fn from_table(table: &dyn Table) -> Result<Self> {
        let mut copy = Self::new(table.metadata().clone());
        for_each_row(table, |_, values| {
            copy.rows.push(values);
            Ok(())
        })?;
        Ok(copy)
    }

    /// Append a row given in column order
    pub fn add_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.metadata.column_count() {
            return Err(Error::InvalidArgument(format!(
                "row has {} values, table {} has {} columns",
                values.len(),
                self.metadata.table_name(),
                self.metadata.column_count()
            )));
        }
        self.rows.push(values);
        Ok(())
    }

    /// Append every row of `other`, matching columns by name
    ///
    /// Columns of this table missing from `other` are filled with `Null`;
    /// a column of `other` unknown to this table is an error.
    pub fn add_table_rows(&mut self, other: &dyn Table) -> Result<()> {
        let other_meta = other.metadata();
        for column in other_meta.columns() {
            if !self.metadata.has_column(&column.name) {
                return Err(Error::no_such_column(
                    self.metadata.table_name(),
                    &column.name,
                ));
            }
        }

        // position in `other` for each of our columns
        let mapping: Vec<Option<usize>> = self
            .metadata
            .columns()
            .iter()
            .map(|c| other_meta.column_index(&c.name).ok())
            .collect();

        let mut appended = Vec::new();
        for_each_row(other, |_, values| {
            let row = mapping
                .iter()
                .map(|slot| slot.map_or(Value::Null, |i| values[i].clone()))
                .collect();
            appended.push(row);
            Ok(())
        })?;
        self.rows.extend(appended);
        Ok(())
    }

    /// Replace a single cell
    pub fn set_value(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        let index = self.metadata.column_index(column)?;
        let available = self.rows.len();
        let slot = self
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::RowOutOfBounds {
                table: self.metadata.table_name().to_string(),
                row,
                available,
            })?;
        slot[index] = value;
        Ok(())
    }

    /// Rows in column order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Mutable access to the rows
    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    /// Wrap this table in a shared handle
    pub fn into_ref(self) -> TableRef {
        Arc::new(self)
    }
}

impl Table for DefaultTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn row_count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        let index = self.metadata.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| r[index].clone())
            .ok_or_else(|| Error::RowOutOfBounds {
                table: self.metadata.table_name().to_string(),
                row,
                available: self.rows.len(),
            })
    }
}
