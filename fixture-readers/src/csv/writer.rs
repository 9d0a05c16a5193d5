//! CSV fixture writer

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use fixture_core::registry::names_equal;
use fixture_core::source::DataSetProducerAdapter;
use fixture_core::{DataSet, DataSetConsumer, DataSetProducer, TableMetadata, Value};
use tracing::debug;

use super::parser::format_value;
use super::CsvOptions;
use crate::error::{Error, Result};

/// Consumer writing a dataset as a CSV directory
///
/// Each table becomes `<table>.csv` with a header row, and the ordering
/// file lists the tables in the order they arrived, so that
/// [`CsvProducer`](super::CsvProducer) reads the directory back in the same
/// order.
pub struct CsvDataSetWriter {
    dir: PathBuf,
    options: CsvOptions,
    written: Vec<String>,
    current: Option<TableWriter>,
}

struct TableWriter {
    name: String,
    width: usize,
    writer: csv::Writer<File>,
}

impl CsvDataSetWriter {
    /// Writer into `dir`, created when the dataset starts
    pub fn new(dir: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
            written: Vec::new(),
            current: None,
        }
    }

    /// Tables written so far
    pub fn tables(&self) -> &[String] {
        &self.written
    }

    fn current(&mut self) -> Result<&mut TableWriter> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::Format("no table started".into()))
    }

    fn open_table(&mut self, metadata: &TableMetadata) -> Result<()> {
        let name = metadata.table_name();
        if self.current.is_some() {
            return Err(Error::Format(format!(
                "table {name} started before the previous one ended"
            )));
        }
        if self.written.iter().any(|n| names_equal(n, name, false)) {
            return Err(fixture_core::Error::DuplicateName(name.to_string()).into());
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .from_path(self.dir.join(format!("{name}.csv")))?;
        writer.write_record(metadata.column_names())?;

        self.written.push(name.to_string());
        self.current = Some(TableWriter {
            name: name.to_string(),
            width: metadata.column_count(),
            writer,
        });
        Ok(())
    }

    fn write_row(&mut self, values: &[Value]) -> Result<()> {
        let null_token = self.options.null_token.clone();
        let table = self.current()?;
        if values.len() != table.width {
            return Err(Error::Format(format!(
                "row of table {} has {} values, expected {}",
                table.name,
                values.len(),
                table.width
            )));
        }
        table
            .writer
            .write_record(values.iter().map(|v| format_value(v, &null_token)))?;
        Ok(())
    }

    fn close_table(&mut self) -> Result<()> {
        let mut table = self
            .current
            .take()
            .ok_or_else(|| Error::Format("no table started".into()))?;
        table.writer.flush()?;
        debug!(table = %table.name, "csv table written");
        Ok(())
    }

    fn write_ordering(&self) -> Result<()> {
        let mut text = self.written.join("\n");
        text.push('\n');
        fs::write(self.dir.join(&self.options.ordering_file), text)?;
        Ok(())
    }
}

impl DataSetConsumer for CsvDataSetWriter {
    fn start_dataset(&mut self) -> fixture_core::Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.written.clear();
        self.current = None;
        Ok(())
    }

    fn end_dataset(&mut self) -> fixture_core::Result<()> {
        if let Some(table) = &self.current {
            return Err(Error::Format(format!("table {} was not ended", table.name)).into());
        }
        Ok(self.write_ordering()?)
    }

    fn start_table(&mut self, metadata: &TableMetadata) -> fixture_core::Result<()> {
        Ok(self.open_table(metadata)?)
    }

    fn end_table(&mut self) -> fixture_core::Result<()> {
        Ok(self.close_table()?)
    }

    fn row(&mut self, values: &[Value]) -> fixture_core::Result<()> {
        Ok(self.write_row(values)?)
    }
}

/// Write `dataset` into `dir` as a CSV directory
pub fn write_dataset(dataset: &dyn DataSet, dir: &Path, options: CsvOptions) -> Result<()> {
    let mut writer = CsvDataSetWriter::new(dir, options);
    DataSetProducerAdapter::new(dataset).produce(&mut writer)?;
    Ok(())
}
