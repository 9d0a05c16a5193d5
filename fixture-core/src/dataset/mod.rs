//! Datasets: ordered collections of tables
//!
//! A [`DataSet`] lists its tables in registration order and hands out
//! [`TableIterator`]s over them, forward or reversed. Decorators in this
//! module filter, combine, rewrite or stream another dataset; the
//! [`CachedDataSet`] builds one from producer events.

mod cached;
mod composite;
mod filter;
mod filtered;
mod forward_only;
mod iterator;
mod replacement;
mod source;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::registry::OrderedTableNameMap;
use crate::schema::TableMetadata;
use crate::table::TableRef;

pub use cached::CachedDataSet;
pub use composite::CompositeDataSet;
pub use filter::{
    ExcludeTableFilter, IncludeTableFilter, PredicateTableFilter, SequenceTableFilter, TableFilter,
};
pub use filtered::FilteredDataSet;
pub use forward_only::ForwardOnlyDataSet;
pub use iterator::{DefaultTableIterator, LookupTableIterator, MapTableIterator, TableIterator};
pub use replacement::ReplacementDataSet;
pub use source::SourceDataSet;

/// An ordered collection of tables
pub trait DataSet: Send + Sync {
    /// Table names in registration order
    fn table_names(&self) -> Result<Vec<String>>;

    /// Metadata of one table
    fn table_metadata(&self, name: &str) -> Result<TableMetadata>;

    /// Look up one table by name
    fn table(&self, name: &str) -> Result<TableRef>;

    /// Iterator over the tables in registration order
    fn iter(&self) -> Result<Box<dyn TableIterator + '_>>;

    /// Iterator over the tables in reverse registration order
    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>>;

    /// Whether table names are compared verbatim
    fn is_case_sensitive(&self) -> bool;

    /// All tables in registration order
    fn tables(&self) -> Result<Vec<TableRef>> {
        let mut tables = Vec::new();
        let mut iter = self.iter()?;
        while iter.next()? {
            tables.push(iter.table()?);
        }
        Ok(tables)
    }
}

/// Shared handle to a dataset
pub type DataSetRef = Arc<dyn DataSet>;

/// An in-memory dataset
#[derive(Clone, Default)]
pub struct DefaultDataSet {
    tables: OrderedTableNameMap<TableRef>,
}

impl DefaultDataSet {
    /// Create an empty dataset
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            tables: OrderedTableNameMap::new(case_sensitive),
        }
    }

    /// Create a dataset from tables
    ///
    /// Either every table is registered or, on a duplicate name, none is.
    pub fn from_tables(tables: Vec<TableRef>, case_sensitive: bool) -> Result<Self> {
        let mut dataset = Self::new(case_sensitive);
        for table in tables {
            dataset.add_table(table)?;
        }
        Ok(dataset)
    }

    /// Register a table under its own name
    pub fn add_table(&mut self, table: TableRef) -> Result<()> {
        let name = table.name().to_string();
        self.tables.add(name, table)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the dataset has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub(crate) fn from_registry(tables: OrderedTableNameMap<TableRef>) -> Self {
        Self { tables }
    }
}

impl DataSet for DefaultDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.ordered_names())
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        Ok(self.table(name)?.metadata().clone())
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoSuchTable(name.to_string()))
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        Ok(Box::new(DefaultTableIterator::new(
            self.tables.ordered_values().into_iter().cloned().collect(),
            false,
        )))
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        Ok(Box::new(DefaultTableIterator::new(
            self.tables.ordered_values().into_iter().cloned().collect(),
            true,
        )))
    }

    fn is_case_sensitive(&self) -> bool {
        self.tables.case_sensitive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::tests::grid;

    /// Dataset of `grid` tables with the given names
    pub(crate) fn dataset(names: &[&str]) -> DefaultDataSet {
        let tables = names.iter().map(|n| grid(n, 2, 2).into_ref()).collect();
        DefaultDataSet::from_tables(tables, false).unwrap()
    }

    pub(crate) fn iterated_names(iter: &mut dyn TableIterator) -> Vec<String> {
        let mut names = Vec::new();
        while iter.next().unwrap() {
            names.push(iter.table_metadata().unwrap().table_name().to_string());
        }
        names
    }

    #[test]
    fn test_default_dataset_order() {
        let ds = dataset(&["b", "a", "c"]);
        assert_eq!(ds.table_names().unwrap(), vec!["b", "a", "c"]);
        assert_eq!(iterated_names(ds.iter().unwrap().as_mut()), vec!["b", "a", "c"]);
        assert_eq!(
            iterated_names(ds.reverse_iter().unwrap().as_mut()),
            vec!["c", "a", "b"]
        );
        assert_eq!(ds.tables().unwrap().len(), 3);
    }

    #[test]
    fn test_lookup_folds_case() {
        let ds = dataset(&["Orders"]);
        assert_eq!(ds.table("ORDERS").unwrap().name(), "Orders");
        assert!(matches!(ds.table("x"), Err(Error::NoSuchTable(_))));
    }

    #[test]
    fn test_from_tables_rejects_duplicates() {
        let tables = vec![grid("a", 1, 1).into_ref(), grid("A", 1, 1).into_ref()];
        assert!(matches!(
            DefaultDataSet::from_tables(tables, false),
            Err(Error::DuplicateName(_))
        ));
    }
}
