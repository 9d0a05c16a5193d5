use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::iterator::{MapTableIterator, TableIterator};
use super::{DataSet, DataSetRef};
use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::table::{ForwardOnlyTable, TableRef};

/// Single-pass view over another dataset
///
/// Exactly one forward iterator may be created. Name lookups, listings and
/// reverse iteration fail with [`Error::Unsupported`], and every table
/// handed out is a [`ForwardOnlyTable`].
pub struct ForwardOnlyDataSet {
    inner: DataSetRef,
    iterators: AtomicUsize,
}

impl ForwardOnlyDataSet {
    /// Wrap `inner`
    pub fn new(inner: DataSetRef) -> Self {
        Self {
            inner,
            iterators: AtomicUsize::new(0),
        }
    }
}

fn unsupported(what: &str) -> Error {
    Error::unsupported(format!("{what} is not supported by a forward-only dataset"))
}

impl DataSet for ForwardOnlyDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        Err(unsupported("listing table names"))
    }

    fn table_metadata(&self, _name: &str) -> Result<TableMetadata> {
        Err(unsupported("table metadata lookup"))
    }

    fn table(&self, _name: &str) -> Result<TableRef> {
        Err(unsupported("table lookup"))
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        if self.iterators.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(Error::unsupported(
                "only one iterator allowed on a forward-only dataset",
            ));
        }
        Ok(Box::new(MapTableIterator::new(self.inner.iter()?, |table| {
            Ok(Arc::new(ForwardOnlyTable::new(table)) as TableRef)
        })))
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        Err(unsupported("reverse iteration"))
    }

    fn is_case_sensitive(&self) -> bool {
        self.inner.is_case_sensitive()
    }

    fn tables(&self) -> Result<Vec<TableRef>> {
        Err(unsupported("listing tables"))
    }
}
