//! Writing datasets into a database through a [`RowSink`]

use std::collections::HashSet;

use tracing::{debug, info};

use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::registry::fold_name;
use crate::schema::TableMetadata;
use crate::sink::RowSink;
use crate::table::read_row;
use crate::value::Value;

/// How a dataset is applied to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseOperation {
    /// Do nothing
    None,
    /// Insert every row
    Insert,
    /// Update every row by primary key
    Update,
    /// Update rows that exist, insert the others
    Refresh,
    /// Delete every dataset row by primary key
    Delete,
    /// Delete all rows of every dataset table
    DeleteAll,
    /// Truncate every dataset table
    Truncate,
    /// [`DeleteAll`](Self::DeleteAll) followed by [`Insert`](Self::Insert)
    CleanInsert,
}

/// Work done by an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// Tables touched
    pub tables: usize,
    /// Rows written or removed
    pub rows: usize,
}

impl DatabaseOperation {
    /// Apply `dataset` to `sink`
    ///
    /// Inserting operations walk tables in dataset order; deleting ones walk
    /// them in reverse so that children go before their parents.
    pub fn execute(self, sink: &mut dyn RowSink, dataset: &dyn DataSet) -> Result<OperationStats> {
        let stats = match self {
            DatabaseOperation::None => OperationStats::default(),
            DatabaseOperation::Insert
            | DatabaseOperation::Update
            | DatabaseOperation::Refresh
            | DatabaseOperation::Delete => self.execute_rows(sink, dataset)?,
            DatabaseOperation::DeleteAll | DatabaseOperation::Truncate => {
                self.execute_tables(sink, dataset)?
            }
            DatabaseOperation::CleanInsert => {
                let deleted = DatabaseOperation::DeleteAll.execute(sink, dataset)?;
                let inserted = DatabaseOperation::Insert.execute(sink, dataset)?;
                OperationStats {
                    tables: inserted.tables,
                    rows: deleted.rows + inserted.rows,
                }
            }
        };
        info!(operation = ?self, tables = stats.tables, rows = stats.rows, "operation complete");
        Ok(stats)
    }

    fn needs_primary_key(self) -> bool {
        matches!(
            self,
            DatabaseOperation::Update | DatabaseOperation::Refresh | DatabaseOperation::Delete
        )
    }

    /// Row-by-row operations
    fn execute_rows(self, sink: &mut dyn RowSink, dataset: &dyn DataSet) -> Result<OperationStats> {
        let mut iter = if self == DatabaseOperation::Delete {
            dataset.reverse_iter()?
        } else {
            dataset.iter()?
        };

        let mut stats = OperationStats::default();
        while iter.next()? {
            let table = iter.table()?;
            let metadata = sink.resolve_metadata(table.metadata())?;
            if self.needs_primary_key() && !metadata.has_primary_key() {
                return Err(Error::NoPrimaryKey(metadata.table_name().to_string()));
            }

            let mut rows = 0usize;
            while let Some(values) = read_row(table.as_ref(), rows)? {
                let values = cast_row(&metadata, values)?;
                self.apply_row(sink, &metadata, &values)?;
                rows += 1;
            }
            debug!(operation = ?self, table = %table.name(), rows, "table applied");
            stats.tables += 1;
            stats.rows += rows;
        }
        Ok(stats)
    }

    fn apply_row(
        self,
        sink: &mut dyn RowSink,
        metadata: &TableMetadata,
        values: &[Value],
    ) -> Result<()> {
        match self {
            DatabaseOperation::Insert => sink.insert_row(metadata, values),
            DatabaseOperation::Update => match sink.update_row(metadata, values)? {
                1 => Ok(()),
                affected => Err(Error::InvalidArgument(format!(
                    "expected 1 row updated in {}, got {affected}",
                    metadata.table_name()
                ))),
            },
            DatabaseOperation::Refresh => {
                if sink.row_exists(metadata, values)? {
                    sink.update_row(metadata, values).map(|_| ())
                } else {
                    sink.insert_row(metadata, values)
                }
            }
            DatabaseOperation::Delete => sink.delete_row(metadata, values).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Whole-table operations, each table once, in reverse order
    fn execute_tables(
        self,
        sink: &mut dyn RowSink,
        dataset: &dyn DataSet,
    ) -> Result<OperationStats> {
        let mut iter = dataset.reverse_iter()?;
        let mut seen = HashSet::new();
        let mut stats = OperationStats::default();
        while iter.next()? {
            let metadata = iter.table_metadata()?;
            let key = fold_name(metadata.table_name(), dataset.is_case_sensitive()).into_owned();
            if !seen.insert(key) {
                continue;
            }
            if self == DatabaseOperation::Truncate {
                sink.truncate(&metadata)?;
            } else {
                sink.delete_all(&metadata)?;
            }
            stats.tables += 1;
        }
        Ok(stats)
    }
}

/// Coerce every value to its column's type
fn cast_row(metadata: &TableMetadata, values: Vec<Value>) -> Result<Vec<Value>> {
    metadata
        .columns()
        .iter()
        .zip(values)
        .map(|(column, value)| column.data_type.type_cast(&value))
        .collect()
}
