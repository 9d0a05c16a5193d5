use std::cmp::Ordering;

use super::{Table, TableRef};
use crate::error::{Error, Result};
use crate::schema::{Column, TableMetadata};
use crate::value::Value;

/// How [`SortedTable`] orders values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Coerce through each column's data type before comparing
    #[default]
    Typed,

    /// Compare raw values with [`Value::natural_cmp`]
    Natural,
}

/// Sorted view over a materialized table
///
/// The sort is computed once on construction and is stable, so rows with
/// equal keys keep their original relative order.
pub struct SortedTable {
    inner: TableRef,
    /// Inner row index for each sorted position
    order: Vec<usize>,
}

impl SortedTable {
    /// Sort by every column, left to right
    pub fn new(inner: TableRef, mode: SortMode) -> Result<Self> {
        let columns = inner.metadata().columns().to_vec();
        Self::sort(inner, &columns, mode)
    }

    /// Sort by the primary key columns of `metadata`
    pub fn by_primary_key(
        inner: TableRef,
        metadata: &TableMetadata,
        mode: SortMode,
    ) -> Result<Self> {
        let columns = metadata
            .primary_keys()
            .iter()
            .map(|k| inner.metadata().column_by_name(k).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::sort(inner, &columns, mode)
    }

    /// Sort by the named columns
    pub fn by_columns(inner: TableRef, columns: &[&str], mode: SortMode) -> Result<Self> {
        let columns = columns
            .iter()
            .map(|name| inner.metadata().column_by_name(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::sort(inner, &columns, mode)
    }

    fn sort(inner: TableRef, columns: &[Column], mode: SortMode) -> Result<Self> {
        let rows = inner.row_count()?;

        let mut keys: Vec<Vec<Value>> = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut key = Vec::with_capacity(columns.len());
            for column in columns {
                let value = inner.value(row, &column.name)?;
                key.push(match mode {
                    SortMode::Typed => column.data_type.type_cast(&value)?,
                    SortMode::Natural => value,
                });
            }
            keys.push(key);
        }

        let mut order: Vec<usize> = (0..rows).collect();
        order.sort_by(|&a, &b| compare_keys(columns, mode, &keys[a], &keys[b]));
        Ok(Self { inner, order })
    }
}

fn compare_keys(columns: &[Column], mode: SortMode, a: &[Value], b: &[Value]) -> Ordering {
    for ((column, x), y) in columns.iter().zip(a).zip(b) {
        let ordering = match mode {
            SortMode::Typed => column
                .data_type
                .compare(x, y)
                .unwrap_or_else(|_| x.natural_cmp(y)),
            SortMode::Natural => x.natural_cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

impl Table for SortedTable {
    fn metadata(&self) -> &TableMetadata {
        self.inner.metadata()
    }

    fn row_count(&self) -> Result<usize> {
        Ok(self.order.len())
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        match self.order.get(row) {
            Some(&inner_row) => self.inner.value(inner_row, column),
            None => Err(Error::RowOutOfBounds {
                table: self.name().to_string(),
                row,
                available: self.order.len(),
            }),
        }
    }
}
