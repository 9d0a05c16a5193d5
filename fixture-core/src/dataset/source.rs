use std::sync::Arc;

use tracing::debug;

use super::iterator::{LookupTableIterator, TableIterator};
use super::DataSet;
use crate::config::{FixtureConfig, TableMode};
use crate::error::{Error, Result};
use crate::registry::OrderedTableNameMap;
use crate::schema::TableMetadata;
use crate::source::{RowCursor, RowSource};
use crate::table::{load_cursor, StreamingTable, TableRef};

/// Dataset reading its tables from a [`RowSource`]
///
/// Each registered table is either a whole source table or the result of
/// a query. Tables are opened when looked up or reached by an iterator;
/// in [`TableMode::Cached`] they are read fully into memory, in
/// [`TableMode::ForwardOnly`] they stream from the open cursor.
pub struct SourceDataSet {
    source: Arc<dyn RowSource>,
    /// Registered name -> query, `None` for a whole table
    tables: OrderedTableNameMap<Option<String>>,
    mode: TableMode,
}

impl SourceDataSet {
    /// Dataset over every table the source lists
    pub fn new(source: Arc<dyn RowSource>, config: &FixtureConfig) -> Result<Self> {
        let names = source.table_names()?;
        let mut dataset = Self::empty(source, config);
        for name in names {
            dataset.add_table(&name)?;
        }
        Ok(dataset)
    }

    /// Dataset with no tables registered yet
    pub fn empty(source: Arc<dyn RowSource>, config: &FixtureConfig) -> Self {
        Self {
            source,
            tables: OrderedTableNameMap::new(config.case_sensitive_table_names),
            mode: config.table_mode,
        }
    }

    /// Register a whole source table
    pub fn add_table(&mut self, name: &str) -> Result<()> {
        self.tables.add(name, None)
    }

    /// Register a query whose result is exposed as table `name`
    pub fn add_query(&mut self, name: &str, query: &str) -> Result<()> {
        self.tables.add(name, Some(query.to_string()))
    }

    fn open(&self, name: &str) -> Result<Box<dyn RowCursor>> {
        let query = self
            .tables
            .get(name)
            .ok_or_else(|| Error::NoSuchTable(name.to_string()))?;
        let registered = self.tables.registered_name(name).unwrap_or(name);
        match query {
            Some(sql) => self.source.open_query(registered, sql),
            None => self.source.open_table(registered),
        }
    }
}

impl DataSet for SourceDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.ordered_names())
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        match self.tables.get(name) {
            Some(None) => {
                let registered = self.tables.registered_name(name).unwrap_or(name);
                self.source.table_metadata(registered)
            }
            Some(Some(_)) => {
                let mut cursor = self.open(name)?;
                let metadata = cursor.metadata().clone();
                cursor.close()?;
                Ok(metadata)
            }
            None => Err(Error::NoSuchTable(name.to_string())),
        }
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        let cursor = self.open(name)?;
        debug!(table = %name, mode = ?self.mode, "opening table");
        Ok(match self.mode {
            TableMode::Cached => Arc::new(load_cursor(cursor)?),
            TableMode::ForwardOnly => Arc::new(StreamingTable::new(cursor)),
        })
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        let names = self.tables.ordered_names();
        Ok(Box::new(LookupTableIterator::new(self, names)))
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        let mut names = self.tables.ordered_names();
        names.reverse();
        Ok(Box::new(LookupTableIterator::new(self, names)))
    }

    fn is_case_sensitive(&self) -> bool {
        self.tables.case_sensitive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::iterated_names;
    use crate::memory::MemoryDatabase;
    use crate::table::tests::grid;
    use crate::value::Value;

    fn database() -> MemoryDatabase {
        MemoryDatabase::new(false)
            .with_table(grid("orders", 3, 2))
            .unwrap()
            .with_table(grid("customers", 1, 1))
            .unwrap()
            .with_query("select c1 from orders", grid("orders", 3, 1))
    }

    #[test]
    fn test_cached_mode_loads_tables() {
        let db = Arc::new(database());
        let ds = SourceDataSet::new(db.clone(), &FixtureConfig::default()).unwrap();
        assert_eq!(ds.table_names().unwrap(), vec!["orders", "customers"]);

        let orders = ds.table("ORDERS").unwrap();
        assert_eq!(orders.row_count().unwrap(), 3);
        assert_eq!(orders.value(2, "c2").unwrap(), Value::Int(22));
        assert_eq!(db.opened_cursors(), db.closed_cursors());
        assert_eq!(
            iterated_names(ds.reverse_iter().unwrap().as_mut()),
            vec!["customers", "orders"]
        );
    }

    #[test]
    fn test_forward_only_mode_streams() {
        let db = Arc::new(database());
        let config = FixtureConfig {
            table_mode: TableMode::ForwardOnly,
            ..FixtureConfig::default()
        };
        let ds = SourceDataSet::new(db.clone(), &config).unwrap();
        let orders = ds.table("orders").unwrap();
        assert!(orders.row_count().unwrap_err().is_unsupported());
        assert_eq!(orders.value(0, "c1").unwrap(), Value::Int(1));
        assert_eq!(db.closed_cursors(), 0);
        drop(orders);
        assert_eq!(db.closed_cursors(), 1);
    }

    #[test]
    fn test_query_tables() {
        let db = Arc::new(database());
        let mut ds = SourceDataSet::empty(db, &FixtureConfig::default());
        ds.add_query("recent", "select c1 from orders").unwrap();
        assert!(matches!(ds.add_table("RECENT"), Err(Error::DuplicateName(_))));

        let metadata = ds.table_metadata("recent").unwrap();
        assert_eq!(metadata.column_names(), vec!["c1"]);
        assert_eq!(ds.table("recent").unwrap().name(), "recent");
        assert!(matches!(ds.table("missing"), Err(Error::NoSuchTable(_))));
    }
}
