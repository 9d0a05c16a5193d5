//! In-memory database for fixtures and tests
//!
//! [`MemoryDatabase`] implements the read side ([`RowSource`]), the schema
//! side ([`ForeignKeyProvider`]) and the write side ([`RowSink`]) over
//! plain [`DefaultTable`]s. Primary keys and, optionally, foreign keys are
//! enforced so that operation ordering mistakes surface as errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::registry::{names_equal, OrderedTableNameMap};
use crate::schema::TableMetadata;
use crate::search::{ForeignKey, ForeignKeyProvider};
use crate::sink::RowSink;
use crate::source::{RowCursor, RowSource};
use crate::table::{DefaultTable, Table};
use crate::value::Value;

/// Cursor over a snapshot of an in-memory table
pub struct MemoryCursor {
    metadata: TableMetadata,
    rows: std::vec::IntoIter<Vec<Value>>,
    closes: Arc<AtomicUsize>,
}

impl MemoryCursor {
    /// Cursor over a copy of `table`; `closes` is bumped on close
    pub fn new(table: &DefaultTable, closes: Arc<AtomicUsize>) -> Self {
        Self {
            metadata: table.metadata().clone(),
            rows: table.rows().to_vec().into_iter(),
            closes,
        }
    }
}

impl RowCursor for MemoryCursor {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A small in-memory database
pub struct MemoryDatabase {
    tables: OrderedTableNameMap<DefaultTable>,
    queries: HashMap<String, DefaultTable>,
    foreign_keys: Vec<ForeignKey>,
    enforce_foreign_keys: bool,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            tables: OrderedTableNameMap::new(case_sensitive),
            queries: HashMap::new(),
            foreign_keys: Vec::new(),
            enforce_foreign_keys: false,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a table with its rows
    pub fn with_table(mut self, table: DefaultTable) -> Result<Self> {
        let name = table.name().to_string();
        self.tables.add(name, table)?;
        Ok(self)
    }

    /// Register a canned result for a query text
    #[must_use]
    pub fn with_query(mut self, query: &str, result: DefaultTable) -> Self {
        self.queries.insert(query.to_string(), result);
        self
    }

    /// Declare a foreign key
    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Reject writes that break declared foreign keys
    #[must_use]
    pub fn enforcing_foreign_keys(mut self) -> Self {
        self.enforce_foreign_keys = true;
        self
    }

    /// Copy of a table's current content
    pub fn snapshot(&self, table: &str) -> Result<DefaultTable> {
        Ok(self.stored(table)?.clone())
    }

    /// Cursors opened so far
    pub fn opened_cursors(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Cursors closed so far
    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn case_sensitive(&self) -> bool {
        self.tables.case_sensitive()
    }

    fn stored(&self, table: &str) -> Result<&DefaultTable> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::NoSuchTable(table.to_string()))
    }

    fn stored_mut(&mut self, table: &str) -> Result<&mut DefaultTable> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| Error::NoSuchTable(table.to_string()))
    }

    fn cursor(&self, table: &DefaultTable) -> Box<dyn RowCursor> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(MemoryCursor::new(table, Arc::clone(&self.closed)))
    }

    /// Lay `values` (in `metadata` column order) out in stored column order
    fn to_stored_row(&self, metadata: &TableMetadata, values: &[Value]) -> Result<Vec<Value>> {
        let stored = self.stored(metadata.table_name())?.metadata();
        let mut row = vec![Value::Null; stored.column_count()];
        for (column, value) in metadata.columns().iter().zip(values) {
            row[stored.column_index(&column.name)?] = value.clone();
        }
        Ok(row)
    }

    /// Stored row positions whose primary key equals the one in `values`
    fn matching_rows(&self, metadata: &TableMetadata, values: &[Value]) -> Result<Vec<usize>> {
        if !metadata.has_primary_key() {
            return Err(Error::NoPrimaryKey(metadata.table_name().to_string()));
        }
        let stored = self.stored(metadata.table_name())?;
        let keys = metadata
            .primary_keys()
            .iter()
            .map(|k| {
                Ok((
                    values[metadata.column_index(k)?].clone(),
                    stored.metadata().column_index(k)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(stored
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                keys.iter()
                    .all(|(value, index)| row[*index].natural_cmp(value).is_eq())
            })
            .map(|(i, _)| i)
            .collect())
    }

    fn column_contains(&self, table: &str, column: &str, value: &Value) -> Result<bool> {
        let stored = self.stored(table)?;
        let index = stored.metadata().column_index(column)?;
        let found = stored.rows().iter().any(|r| r[index].natural_cmp(value).is_eq());
        Ok(found)
    }

    /// Every non-null foreign key value of `row` must exist in its parent
    fn check_parents(&self, table: &str, row: &[Value]) -> Result<()> {
        if !self.enforce_foreign_keys {
            return Ok(());
        }
        let metadata = self.stored(table)?.metadata();
        let declared = self
            .foreign_keys
            .iter()
            .filter(|fk| self.same_table(&fk.fk_table, table));
        for fk in declared {
            let value = &row[metadata.column_index(&fk.fk_column)?];
            if !value.is_null() && !self.column_contains(&fk.pk_table, &fk.pk_column, value)? {
                return Err(violation(fk, value));
            }
        }
        Ok(())
    }

    /// No other table may still reference the given rows of `table`
    fn check_children(&self, table: &str, rows: &[usize]) -> Result<()> {
        if !self.enforce_foreign_keys {
            return Ok(());
        }
        let stored = self.stored(table)?;
        for fk in self.foreign_keys.iter().filter(|fk| {
            self.same_table(&fk.pk_table, table) && !self.same_table(&fk.fk_table, table)
        }) {
            let index = stored.metadata().column_index(&fk.pk_column)?;
            for &row in rows {
                let value = &stored.rows()[row][index];
                if !value.is_null() && self.column_contains(&fk.fk_table, &fk.fk_column, value)? {
                    return Err(violation(fk, value));
                }
            }
        }
        Ok(())
    }

    fn same_table(&self, a: &str, b: &str) -> bool {
        names_equal(a, b, self.case_sensitive())
    }
}

fn violation(fk: &ForeignKey, value: &Value) -> Error {
    Error::InvalidArgument(format!(
        "foreign key violation: {}.{} -> {}.{} (value {value})",
        fk.fk_table, fk.fk_column, fk.pk_table, fk.pk_column
    ))
}

impl RowSource for MemoryDatabase {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.ordered_names())
    }

    fn table_metadata(&self, table: &str) -> Result<TableMetadata> {
        Ok(self.stored(table)?.metadata().clone())
    }

    fn open_table(&self, table: &str) -> Result<Box<dyn RowCursor>> {
        Ok(self.cursor(self.stored(table)?))
    }

    fn open_query(&self, table: &str, query: &str) -> Result<Box<dyn RowCursor>> {
        let result = self
            .queries
            .get(query)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown query: {query}")))?;
        let renamed =
            DefaultTable::with_rows(result.metadata().renamed(table), result.rows().to_vec())?;
        Ok(self.cursor(&renamed))
    }
}

impl ForeignKeyProvider for MemoryDatabase {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.ordered_names())
    }

    fn imported_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        Ok(self
            .foreign_keys
            .iter()
            .filter(|fk| self.same_table(&fk.fk_table, table))
            .cloned()
            .collect())
    }

    fn exported_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        Ok(self
            .foreign_keys
            .iter()
            .filter(|fk| self.same_table(&fk.pk_table, table))
            .cloned()
            .collect())
    }
}

impl RowSink for MemoryDatabase {
    fn resolve_metadata(&self, metadata: &TableMetadata) -> Result<TableMetadata> {
        let stored = self.stored(metadata.table_name())?.metadata();
        let indices = metadata
            .columns()
            .iter()
            .map(|c| stored.column_index(&c.name))
            .collect::<Result<Vec<_>>>()?;
        stored.project(&indices)
    }

    fn insert_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<()> {
        let table = metadata.table_name();
        let row = self.to_stored_row(metadata, values)?;
        if metadata.has_primary_key() && !self.matching_rows(metadata, values)?.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "duplicate primary key in table {table}"
            )));
        }
        self.check_parents(table, &row)?;
        trace!(table = %table, "insert row");
        self.stored_mut(table)?.add_row(row)
    }

    fn update_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<usize> {
        let table = metadata.table_name();
        let matches = self.matching_rows(metadata, values)?;
        let update = self.to_stored_row(metadata, values)?;
        self.check_parents(table, &update)?;

        let positions = metadata
            .columns()
            .iter()
            .map(|c| self.stored(table)?.metadata().column_index(&c.name))
            .collect::<Result<Vec<_>>>()?;
        let stored = self.stored_mut(table)?;
        for &row in &matches {
            for &index in &positions {
                stored.rows_mut()[row][index] = update[index].clone();
            }
        }
        Ok(matches.len())
    }

    fn delete_row(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<usize> {
        let table = metadata.table_name();
        let matches = self.matching_rows(metadata, values)?;
        self.check_children(table, &matches)?;

        let rows = self.stored_mut(table)?.rows_mut();
        for &row in matches.iter().rev() {
            rows.remove(row);
        }
        Ok(matches.len())
    }

    fn row_exists(&mut self, metadata: &TableMetadata, values: &[Value]) -> Result<bool> {
        Ok(!self.matching_rows(metadata, values)?.is_empty())
    }

    fn delete_all(&mut self, metadata: &TableMetadata) -> Result<()> {
        let table = metadata.table_name();
        let all: Vec<usize> = (0..self.stored(table)?.rows().len()).collect();
        self.check_children(table, &all)?;
        self.stored_mut(table)?.rows_mut().clear();
        Ok(())
    }

    fn truncate(&mut self, metadata: &TableMetadata) -> Result<()> {
        self.delete_all(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, DataType};

    fn parent_child() -> MemoryDatabase {
        let parent = TableMetadata::new("parent", vec![Column::new("id", DataType::Integer, false)])
            .unwrap()
            .with_primary_keys(&["id"])
            .unwrap();
        let child = TableMetadata::new(
            "child",
            vec![
                Column::new("id", DataType::Integer, false),
                Column::new("parent_id", DataType::Integer, true),
            ],
        )
        .unwrap()
        .with_primary_keys(&["id"])
        .unwrap();
        MemoryDatabase::new(false)
            .with_table(DefaultTable::new(parent))
            .unwrap()
            .with_table(DefaultTable::new(child))
            .unwrap()
            .with_foreign_key(ForeignKey::new("child", "parent_id", "parent", "id"))
            .enforcing_foreign_keys()
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let mut db = parent_child();
        let parent = db.table_metadata("parent").unwrap();
        let child = db.table_metadata("child").unwrap();

        let orphan = db.insert_row(&child, &[Value::Int(1), Value::Int(7)]);
        assert!(matches!(orphan, Err(Error::InvalidArgument(_))));

        db.insert_row(&parent, &[Value::Int(7)]).unwrap();
        db.insert_row(&child, &[Value::Int(1), Value::Int(7)]).unwrap();
        assert!(db.delete_all(&parent).is_err());

        db.delete_all(&child).unwrap();
        db.delete_all(&parent).unwrap();
        assert_eq!(db.snapshot("parent").unwrap().rows().len(), 0);
    }

    #[test]
    fn test_update_and_delete_by_key() {
        let mut db = parent_child();
        let parent = db.table_metadata("parent").unwrap();
        let child = db.table_metadata("child").unwrap();
        db.insert_row(&parent, &[Value::Int(1)]).unwrap();
        db.insert_row(&parent, &[Value::Int(2)]).unwrap();
        db.insert_row(&child, &[Value::Int(10), Value::Int(1)]).unwrap();

        let moved = db.update_row(&child, &[Value::Int(10), Value::Int(2)]).unwrap();
        assert_eq!(moved, 1);
        let snapshot = db.snapshot("child").unwrap();
        assert_eq!(snapshot.value(0, "parent_id").unwrap(), Value::Int(2));
        let missing = db.update_row(&child, &[Value::Int(11), Value::Int(2)]).unwrap();
        assert_eq!(missing, 0);

        assert_eq!(db.delete_row(&parent, &[Value::Int(1)]).unwrap(), 1);
        assert!(db.row_exists(&parent, &[Value::Int(2)]).unwrap());
        assert!(!db.row_exists(&parent, &[Value::Int(1)]).unwrap());
        assert!(db.insert_row(&parent, &[Value::Int(2)]).is_err());
    }

    #[test]
    fn test_key_lookup() {
        let db = parent_child();
        let imported = db.imported_keys("CHILD").unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].pk_table, "parent");
        assert_eq!(db.exported_keys("parent").unwrap().len(), 1);
        assert!(db.exported_keys("child").unwrap().is_empty());
    }
}
