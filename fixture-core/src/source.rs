//! Row sources and dataset producers
//!
//! A [`RowSource`] is the database side: it lists tables and opens
//! [`RowCursor`]s over them. A [`DataSetProducer`] is the push side: it
//! drives a [`DataSetConsumer`] through start/end events, which is how file
//! readers and [`DataSetProducerAdapter`] feed a pipeline.

use tracing::debug;

use crate::dataset::DataSet;
use crate::error::Result;
use crate::schema::TableMetadata;
use crate::sink::DataSetConsumer;
use crate::table::read_row;
use crate::value::Value;

/// A forward-only cursor over the rows of one table or query
pub trait RowCursor: Send {
    /// Metadata of the rows this cursor yields
    fn metadata(&self) -> &TableMetadata;

    /// Fetch the next row in column order, `None` once exhausted
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;

    /// Release the underlying resource
    ///
    /// Called at most once by the tables in this crate.
    fn close(&mut self) -> Result<()>;
}

/// A database-like source of tables
pub trait RowSource: Send + Sync {
    /// Names of the tables available, in source order
    fn table_names(&self) -> Result<Vec<String>>;

    /// Metadata of a table, including its primary key
    fn table_metadata(&self, table: &str) -> Result<TableMetadata>;

    /// Open a cursor over all rows of a table
    fn open_table(&self, table: &str) -> Result<Box<dyn RowCursor>>;

    /// Open a cursor over the result of a query, exposed as `table`
    fn open_query(&self, table: &str, query: &str) -> Result<Box<dyn RowCursor>>;
}

/// Something that can replay a dataset as consumer events
pub trait DataSetProducer {
    /// Push the whole dataset into `consumer`
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> Result<()>;
}

/// Producer that replays an existing dataset
///
/// Tables are visited through the dataset's forward iterator and rows are
/// read with a single forward sweep, so forward-only datasets work too.
pub struct DataSetProducerAdapter<'a> {
    dataset: &'a dyn DataSet,
}

impl<'a> DataSetProducerAdapter<'a> {
    /// Create a producer over `dataset`
    pub fn new(dataset: &'a dyn DataSet) -> Self {
        Self { dataset }
    }
}

impl DataSetProducer for DataSetProducerAdapter<'_> {
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> Result<()> {
        consumer.start_dataset()?;

        let mut tables = self.dataset.iter()?;
        while tables.next()? {
            let table = tables.table()?;
            consumer.start_table(table.metadata())?;

            let mut rows = 0usize;
            while let Some(values) = read_row(table.as_ref(), rows)? {
                consumer.row(&values)?;
                rows += 1;
            }
            debug!(table = %table.name(), rows, "replayed table");
            consumer.end_table()?;
        }

        consumer.end_dataset()
    }
}
