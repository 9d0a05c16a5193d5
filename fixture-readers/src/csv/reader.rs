//! CSV fixture producer

use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use fixture_core::schema::Column;
use fixture_core::{DataSetConsumer, DataSetProducer, TableMetadata};
use tracing::{debug, warn};

use super::parser::{parse_field, parse_ordering};
use super::CsvOptions;
use crate::common::table_name_from_path;
use crate::error::{Error, Result};

/// Produces a dataset from CSV files
///
/// The path is either a single `.csv` file, read as one table named after
/// the file stem, or a directory holding one `<table>.csv` per table and an
/// ordering file listing the tables in production order. Without an
/// ordering file the directory's `.csv` files are produced sorted by name.
///
/// Every file needs a header row; all columns have unknown type.
pub struct CsvProducer {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvProducer {
    /// Create a producer over `path`
    pub fn new(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Tables to produce with their files, in order
    fn table_files(&self) -> Result<Vec<(String, PathBuf)>> {
        if !self.path.is_dir() {
            let name = table_name_from_path(&self.path)
                .ok_or_else(|| Error::Format(format!("no table name in {}", self.path.display())))?;
            return Ok(vec![(name.to_string(), self.path.clone())]);
        }

        let ordering = self.path.join(&self.options.ordering_file);
        if ordering.is_file() {
            let names = parse_ordering(&fs::read_to_string(&ordering)?);
            return Ok(names
                .into_iter()
                .map(|name| {
                    let file = self.path.join(format!("{name}.csv"));
                    (name, file)
                })
                .collect());
        }

        warn!(dir = %self.path.display(), "no ordering file, producing tables by file name");
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if let (true, Some(name)) = (is_csv, table_name_from_path(&path)) {
                files.push((name.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn produce_table(
        &self,
        name: &str,
        path: &Path,
        consumer: &mut dyn DataSetConsumer,
    ) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let columns: Vec<Column> = reader
            .headers()?
            .iter()
            .map(|h| Column::unknown(h.trim()))
            .collect();
        let width = columns.len();
        let metadata = TableMetadata::new(name, columns)?;

        consumer.start_table(&metadata)?;
        let mut rows = 0usize;
        for record in reader.records() {
            let record = record?;
            if record.len() != width {
                return Err(Error::Format(format!(
                    "row {} of table {name} has {} fields, expected {width}",
                    rows + 1,
                    record.len()
                )));
            }
            let values: Vec<_> = record
                .iter()
                .map(|field| parse_field(field, &self.options.null_token))
                .collect();
            consumer.row(&values)?;
            rows += 1;
        }
        consumer.end_table()?;
        debug!(table = name, rows, "csv table produced");
        Ok(())
    }
}

impl DataSetProducer for CsvProducer {
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> fixture_core::Result<()> {
        consumer.start_dataset()?;
        for (name, path) in self.table_files()? {
            self.produce_table(&name, &path, consumer)?;
        }
        consumer.end_dataset()
    }
}
