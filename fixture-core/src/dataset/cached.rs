use tracing::{debug, trace};

use super::iterator::TableIterator;
use super::{DataSet, DefaultDataSet};
use crate::error::{Error, Result};
use crate::registry::OrderedTableNameMap;
use crate::schema::TableMetadata;
use crate::sink::DataSetConsumer;
use crate::source::{DataSetProducer, DataSetProducerAdapter};
use crate::table::{DefaultTable, Table, TableRef};
use crate::value::Value;

/// Tables being built between `start_dataset` and `end_dataset`
struct Pending {
    tables: OrderedTableNameMap<DefaultTable>,
    active: Option<DefaultTable>,
}

/// Dataset materialized from producer events
///
/// Acts as a [`DataSetConsumer`]: tables are accumulated while events
/// arrive and only become visible once `end_dataset` is received. Two
/// brackets for the same table name are coalesced into one table, with
/// rows appended in arrival order.
pub struct CachedDataSet {
    published: DefaultDataSet,
    pending: Option<Pending>,
    case_sensitive: bool,
}

impl CachedDataSet {
    /// Create an empty consumer
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            published: DefaultDataSet::new(case_sensitive),
            pending: None,
            case_sensitive,
        }
    }

    /// Drain `producer` into a new cached dataset
    pub fn from_producer(producer: &mut dyn DataSetProducer, case_sensitive: bool) -> Result<Self> {
        let mut dataset = Self::new(case_sensitive);
        producer.produce(&mut dataset)?;
        Ok(dataset)
    }

    /// Materialize any dataset, including forward-only ones
    pub fn copy_of(dataset: &dyn DataSet) -> Result<Self> {
        let mut producer = DataSetProducerAdapter::new(dataset);
        Self::from_producer(&mut producer, dataset.is_case_sensitive())
    }

    fn pending(&mut self) -> Result<&mut Pending> {
        self.pending
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("no dataset started".into()))
    }
}

impl DataSetConsumer for CachedDataSet {
    fn start_dataset(&mut self) -> Result<()> {
        trace!("start dataset");
        self.pending = Some(Pending {
            tables: OrderedTableNameMap::new(self.case_sensitive),
            active: None,
        });
        Ok(())
    }

    fn end_dataset(&mut self) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| Error::InvalidArgument("no dataset started".into()))?;
        if let Some(active) = pending.active {
            return Err(Error::InvalidArgument(format!(
                "table {} was not ended",
                active.name()
            )));
        }

        let mut tables: OrderedTableNameMap<TableRef> =
            OrderedTableNameMap::new(self.case_sensitive);
        for table in pending.tables.into_values() {
            let name = table.name().to_string();
            tables.add(name, table.into_ref())?;
        }
        debug!(tables = tables.len(), "dataset cached");
        self.published = DefaultDataSet::from_registry(tables);
        Ok(())
    }

    fn start_table(&mut self, metadata: &TableMetadata) -> Result<()> {
        let pending = self.pending()?;
        if let Some(active) = &pending.active {
            return Err(Error::InvalidArgument(format!(
                "table {} started before {} was ended",
                metadata.table_name(),
                active.name()
            )));
        }
        trace!(table = %metadata.table_name(), "start table");
        pending.active = Some(DefaultTable::new(metadata.clone()));
        Ok(())
    }

    fn end_table(&mut self) -> Result<()> {
        let pending = self.pending()?;
        let table = pending
            .active
            .take()
            .ok_or_else(|| Error::InvalidArgument("no table started".into()))?;
        let name = table.name().to_string();

        match pending.tables.get_mut(&name) {
            Some(existing) => {
                debug!(table = %name, rows = table.rows().len(), "coalescing table bracket");
                existing.add_table_rows(&table)?;
                pending.tables.set_last_name(&name)?;
            }
            None => pending.tables.add(name, table)?,
        }
        Ok(())
    }

    fn row(&mut self, values: &[Value]) -> Result<()> {
        let pending = self.pending()?;
        let table = pending
            .active
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("row received outside a table".into()))?;
        table.add_row(values.to_vec())
    }
}

impl DataSet for CachedDataSet {
    fn table_names(&self) -> Result<Vec<String>> {
        self.published.table_names()
    }

    fn table_metadata(&self, name: &str) -> Result<TableMetadata> {
        self.published.table_metadata(name)
    }

    fn table(&self, name: &str) -> Result<TableRef> {
        self.published.table(name)
    }

    fn iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.published.iter()
    }

    fn reverse_iter(&self) -> Result<Box<dyn TableIterator + '_>> {
        self.published.reverse_iter()
    }

    fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;
    use crate::dataset::ForwardOnlyDataSet;
    use crate::schema::Column;
    use std::sync::Arc;

    fn meta(name: &str) -> TableMetadata {
        TableMetadata::new(name, vec![Column::unknown("id")]).unwrap()
    }

    #[test]
    fn test_tables_hidden_until_end_dataset() {
        let mut cached = CachedDataSet::new(false);
        cached.start_dataset().unwrap();
        cached.start_table(&meta("a")).unwrap();
        cached.row(&[Value::Int(1)]).unwrap();
        cached.end_table().unwrap();
        assert!(cached.table_names().unwrap().is_empty());

        cached.end_dataset().unwrap();
        assert_eq!(cached.table_names().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_repeated_brackets_coalesce() {
        let mut cached = CachedDataSet::new(false);
        cached.start_dataset().unwrap();
        for (name, id) in [("a", 1), ("b", 2), ("A", 3)] {
            cached.start_table(&meta(name)).unwrap();
            cached.row(&[Value::Int(id)]).unwrap();
            cached.end_table().unwrap();
        }
        cached.end_dataset().unwrap();

        assert_eq!(cached.table_names().unwrap(), vec!["a", "b"]);
        let a = cached.table("a").unwrap();
        assert_eq!(a.row_count().unwrap(), 2);
        assert_eq!(a.value(1, "id").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_wrong_row_width_rejected() {
        let mut cached = CachedDataSet::new(false);
        cached.start_dataset().unwrap();
        cached.start_table(&meta("a")).unwrap();
        assert!(matches!(
            cached.row(&[Value::Int(1), Value::Int(2)]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_events_out_of_order() {
        let mut cached = CachedDataSet::new(false);
        assert!(cached.start_table(&meta("a")).is_err());
        cached.start_dataset().unwrap();
        assert!(cached.row(&[Value::Null]).is_err());
        assert!(cached.end_table().is_err());
        cached.start_table(&meta("a")).unwrap();
        assert!(cached.end_dataset().is_err());
    }

    #[test]
    fn test_copy_of_forward_only() {
        let streaming = ForwardOnlyDataSet::new(Arc::new(dataset(&["a", "b"])));
        let copy = CachedDataSet::copy_of(&streaming).unwrap();
        assert_eq!(copy.table_names().unwrap(), vec!["a", "b"]);
        assert_eq!(copy.table("b").unwrap().row_count().unwrap(), 2);
        assert_eq!(copy.table("b").unwrap().value(1, "c2").unwrap(), Value::Int(12));
    }
}
