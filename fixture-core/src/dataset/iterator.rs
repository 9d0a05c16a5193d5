use super::DataSet;
use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::table::TableRef;

/// Cursor over the tables of a dataset
///
/// Starts before the first table; [`next`](TableIterator::next) must be
/// called before the current table can be read.
pub trait TableIterator {
    /// Advance to the next table; `false` once past the last one
    fn next(&mut self) -> Result<bool>;

    /// Metadata of the current table
    fn table_metadata(&self) -> Result<TableMetadata>;

    /// The current table
    fn table(&self) -> Result<TableRef>;
}

fn not_positioned() -> Error {
    Error::InvalidArgument("table iterator is not positioned on a table".into())
}

/// Iterator over a fixed list of tables
pub struct DefaultTableIterator {
    tables: Vec<TableRef>,
    reversed: bool,
    position: Option<usize>,
}

impl DefaultTableIterator {
    /// Iterate `tables`, back to front when `reversed`
    pub fn new(tables: Vec<TableRef>, reversed: bool) -> Self {
        Self {
            tables,
            reversed,
            position: None,
        }
    }

    /// Rewind to before the first table
    pub fn reset(&mut self) {
        self.position = None;
    }

    fn current(&self) -> Result<&TableRef> {
        let step = self
            .position
            .filter(|&p| p < self.tables.len())
            .ok_or_else(not_positioned)?;
        let index = if self.reversed {
            self.tables.len() - 1 - step
        } else {
            step
        };
        Ok(&self.tables[index])
    }
}

impl TableIterator for DefaultTableIterator {
    fn next(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| (p + 1).min(self.tables.len()));
        self.position = Some(next);
        Ok(next < self.tables.len())
    }

    fn table_metadata(&self) -> Result<TableMetadata> {
        Ok(self.current()?.metadata().clone())
    }

    fn table(&self) -> Result<TableRef> {
        self.current().cloned()
    }
}

/// Iterator that looks tables up by name in a dataset, one at a time
///
/// Tables are only fetched when the iterator reaches them.
pub struct LookupTableIterator<'a> {
    dataset: &'a dyn DataSet,
    names: Vec<String>,
    position: Option<usize>,
    current: Option<TableRef>,
}

impl<'a> LookupTableIterator<'a> {
    /// Iterate the named tables of `dataset` in the given order
    pub fn new(dataset: &'a dyn DataSet, names: Vec<String>) -> Self {
        Self {
            dataset,
            names,
            position: None,
            current: None,
        }
    }
}

impl TableIterator for LookupTableIterator<'_> {
    fn next(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| (p + 1).min(self.names.len()));
        self.position = Some(next);
        self.current = None;
        match self.names.get(next) {
            Some(name) => {
                self.current = Some(self.dataset.table(name)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn table_metadata(&self) -> Result<TableMetadata> {
        Ok(self.table()?.metadata().clone())
    }

    fn table(&self) -> Result<TableRef> {
        self.current.clone().ok_or_else(not_positioned)
    }
}

/// Iterator that rewrites each table of another iterator
///
/// `map` runs once per position, when the iterator advances; every
/// [`table`](TableIterator::table) call at that position returns the same
/// mapped table.
pub struct MapTableIterator<'a, F> {
    inner: Box<dyn TableIterator + 'a>,
    map: F,
    current: Option<TableRef>,
}

impl<'a, F> MapTableIterator<'a, F>
where
    F: Fn(TableRef) -> Result<TableRef>,
{
    /// Wrap `inner`, passing every table through `map`
    pub fn new(inner: Box<dyn TableIterator + 'a>, map: F) -> Self {
        Self {
            inner,
            map,
            current: None,
        }
    }
}

impl<F> TableIterator for MapTableIterator<'_, F>
where
    F: Fn(TableRef) -> Result<TableRef>,
{
    fn next(&mut self) -> Result<bool> {
        self.current = None;
        if !self.inner.next()? {
            return Ok(false);
        }
        self.current = Some((self.map)(self.inner.table()?)?);
        Ok(true)
    }

    fn table_metadata(&self) -> Result<TableMetadata> {
        self.inner.table_metadata()
    }

    fn table(&self) -> Result<TableRef> {
        self.current.clone().ok_or_else(not_positioned)
    }
}
