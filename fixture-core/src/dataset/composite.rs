use std::sync::Arc;

use tracing::debug;

use super::iterator::TableIterator;
use super::{DataSet, DataSetRef, DefaultDataSet};
use crate::error::{Error, Result};
use crate::registry::OrderedTableNameMap;
use crate::schema::TableMetadata;
use crate::table::{CompositeTable, TableRef};

/// Several datasets merged into one
///
/// Tables keep the order in which they first appear across the inputs.
/// With `combine`, tables sharing a name are concatenated into a
/// [`CompositeTable`]; without it a repeated name is an error.
pub struct CompositeDataSet {
    dataset: DefaultDataSet,
}

impl CompositeDataSet {
    /// Merge `datasets`, front to back
    pub fn new(datasets: &[DataSetRef], combine: bool, case_sensitive: bool) -> Result<Self> {
        let mut groups: OrderedTableNameMap<Vec<TableRef>> =
            OrderedTableNameMap::new(case_sensitive);
        for dataset in datasets {
            let mut iter = dataset.iter()?;
            while iter.next()? {
                let table = iter.table()?;
                let name = table.name().to_string();
                match groups.get_mut(&name) {
                    Some(group) if combine => group.push(table),
                    Some(_) => return Err(Error::DuplicateName(name)),
                    None => groups.add(name, vec![table])?,
                }
            }
        }

        let mut merged = OrderedTableNameMap::new(case_sensitive);
        for (name, group) in groups.iter() {
            let table: TableRef = if group.len() == 1 {
                Arc::clone(&group[0])
            } else {
                debug!(table = %name, parts = group.len(), "combining tables");
                Arc::new(CompositeTable::new(group.clone())?)
            };
            merged.add(name, table)?;
        }

        Ok(Self {
            dataset: DefaultDataSet::from_registry(merged),
        })
    }
}

impl DataSet for CompositeDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        self.dataset.table_names()
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        self.dataset.table_metadata(name)
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        self.dataset.table(name)
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.dataset.iter()
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.dataset.reverse_iter()
    }

    fn is_case_sensitive(&self) -> bool {
        self.dataset.is_case_sensitive()
    }
}
