use std::sync::Arc;

use super::iterator::{MapTableIterator, TableIterator};
use super::{DataSet, DataSetRef};
use crate::error::Result;
use crate::schema::TableMetadata;
use crate::table::{ReplacementTable, Replacements, TableRef};

/// Dataset view applying [`Replacements`] to every table
pub struct ReplacementDataSet {
    inner: DataSetRef,
    replacements: Arc<Replacements>,
}

impl ReplacementDataSet {
    /// Wrap `inner`
    pub fn new(inner: DataSetRef, replacements: Replacements) -> Self {
        Self {
            inner,
            replacements: Arc::new(replacements),
        }
    }

    fn wrap(&self, table: TableRef) -> TableRef {
        Arc::new(ReplacementTable::new(table, Arc::clone(&self.replacements)))
    }

    fn wrap_iter<'a>(&'a self, inner: Box<dyn TableIterator + 'a>) -> Box<dyn TableIterator + 'a> {
        let iter = MapTableIterator::new(inner, move |table| Ok(self.wrap(table)));
        Box::new(iter)
    }
}

impl DataSet for ReplacementDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names()
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        self.inner.table_metadata(name)
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        Ok(self.wrap(self.inner.table(name)?))
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        Ok(self.wrap_iter(self.inner.iter()?))
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        Ok(self.wrap_iter(self.inner.reverse_iter()?))
    }

    fn is_case_sensitive(&self) -> bool {
        self.inner.is_case_sensitive()
    }
}
