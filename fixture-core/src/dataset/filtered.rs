use std::sync::Arc;

use tracing::debug;

use super::filter::TableFilter;
use super::iterator::{LookupTableIterator, TableIterator};
use super::{DataSet, DataSetRef};
use crate::error::{Error, Result};
use crate::registry::names_equal;
use crate::schema::TableMetadata;
use crate::table::TableRef;

/// Dataset view exposing only the tables a [`TableFilter`] accepts
///
/// When the filter imposes a sequence, tables are listed and iterated in
/// that order; names absent from the inner dataset are skipped.
pub struct FilteredDataSet {
    inner: DataSetRef,
    filter: Arc<dyn TableFilter>,
}

impl FilteredDataSet {
    /// Wrap `inner`
    pub fn new(inner: DataSetRef, filter: Arc<dyn TableFilter>) -> Self {
        Self { inner, filter }
    }

    /// Names from the filter's sequence that exist in the inner dataset
    fn sequenced_names(&self, sequence: &[String]) -> Result<Vec<String>> {
        let available = match self.inner.table_names() {
            Ok(names) => names,
            // streaming inner datasets cannot list; trust the sequence
            Err(Error::Unsupported(_)) => return Ok(sequence.to_vec()),
            Err(e) => return Err(e),
        };
        let case_sensitive = self.inner.is_case_sensitive();

        let mut names = Vec::with_capacity(sequence.len());
        for name in sequence {
            if available
                .iter()
                .any(|a| names_equal(a, name, case_sensitive))
            {
                names.push(name.clone());
            } else {
                debug!(table = %name, "table from filter sequence not in dataset");
            }
        }
        Ok(names)
    }

    fn check_accepted(&self, name: &str) -> Result<()> {
        if self.filter.accepts(name)? {
            Ok(())
        } else {
            Err(Error::NoSuchTable(name.to_string()))
        }
    }

    fn filtered_iter(&self, reversed: bool) -> Result<Box<dyn TableIterator + '_>> {
        if let Some(sequence) = self.filter.sequence() {
            let mut names = self.sequenced_names(sequence)?;
            if reversed {
                names.reverse();
            }
            let iter = LookupTableIterator::new(self.inner.as_ref(), names);
            return Ok(Box::new(iter));
        }

        let inner = if reversed {
            self.inner.reverse_iter()?
        } else {
            self.inner.iter()?
        };
        Ok(Box::new(FilterIterator {
            inner,
            filter: self.filter.as_ref(),
        }))
    }
}

impl DataSet for FilteredDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        if let Some(sequence) = self.filter.sequence() {
            return self.sequenced_names(sequence);
        }
        let mut names = Vec::new();
        for name in self.inner.table_names()? {
            if self.filter.accepts(&name)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        self.check_accepted(name)?;
        self.inner.table_metadata(name)
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        self.check_accepted(name)?;
        self.inner.table(name)
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.filtered_iter(false)
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.filtered_iter(true)
    }

    fn is_case_sensitive(&self) -> bool {
        self.inner.is_case_sensitive()
    }
}

/// Skips tables the filter rejects
struct FilterIterator<'a> {
    inner: Box<dyn TableIterator + 'a>,
    filter: &'a dyn TableFilter,
}

impl TableIterator for FilterIterator<'_> {
    fn next(&mut self) -> Result<bool> {
        while self.inner.next()? {
            let metadata = self.inner.table_metadata()?;
            if self.filter.accepts(metadata.table_name())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn table_metadata(&self) -> Result<TableMetadata> {
        self.inner.table_metadata()
    }

    fn table(&self) -> Result<TableRef> {
        self.inner.table()
    }
}
