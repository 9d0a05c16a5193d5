//! CSV fixture directories
//!
//! A fixture directory holds one `<table>.csv` per table plus an ordering
//! file naming the tables in the order they are produced. [`CsvProducer`]
//! reads such a directory (or a single CSV file) and
//! [`CsvDataSetWriter`] writes one.

mod parser;
mod reader;
mod writer;

use fixture_core::FixtureConfig;

pub use parser::{format_value, parse_field, parse_ordering};
pub use reader::CsvProducer;
pub use writer::{write_dataset, CsvDataSetWriter};

/// Default name of the ordering file
pub const ORDERING_FILE: &str = "table-ordering.txt";

/// Options for CSV fixtures
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Delimiter character
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// Field text read and written as NULL
    pub null_token: String,

    /// Name of the ordering file inside a fixture directory
    pub ordering_file: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            null_token: "null".to_string(),
            ordering_file: ORDERING_FILE.to_string(),
        }
    }
}

impl CsvOptions {
    /// Defaults with the configured null token
    pub fn from_config(config: &FixtureConfig) -> Self {
        Self {
            null_token: config.null_token.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture_core::compare::assert_datasets_equal;
    use fixture_core::dataset::CachedDataSet;
    use fixture_core::schema::Column;
    use fixture_core::{
        DataSet, DefaultDataSet, DefaultTable, Error as CoreError, TableMetadata, Value,
    };
    use std::fs;

    fn produce(path: &std::path::Path, options: CsvOptions) -> fixture_core::Result<CachedDataSet> {
        CachedDataSet::from_producer(&mut CsvProducer::new(path, options), false)
    }

    #[test]
    fn test_directory_follows_ordering_file() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("customers.csv"), "id,name\n1,Alice\n2,null\n").unwrap();
        fs::write(dir.path().join("orders.csv"), "id,customer_id\n10,1\n").unwrap();
        fs::write(dir.path().join(ORDERING_FILE), "orders\ncustomers\n").unwrap();

        let dataset = produce(dir.path(), CsvOptions::default()).unwrap();
        assert_eq!(dataset.table_names().unwrap(), vec!["orders", "customers"]);

        let customers = dataset.table("CUSTOMERS").unwrap();
        assert_eq!(customers.row_count().unwrap(), 2);
        assert_eq!(customers.value(0, "name").unwrap(), Value::from("Alice"));
        assert_eq!(customers.value(1, "name").unwrap(), Value::Null);
        assert!(customers.metadata().column_by_name("id").unwrap().data_type.is_unknown());
    }

    #[test]
    fn test_repeated_ordering_entries_coalesce() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.csv"), "id\n1\n").unwrap();
        fs::write(dir.path().join(ORDERING_FILE), "t\nt\n").unwrap();

        let dataset = produce(dir.path(), CsvOptions::default()).unwrap();
        assert_eq!(dataset.table("t").unwrap().row_count().unwrap(), 2);
    }

    #[test]
    fn test_directory_without_ordering_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "id\n1\n").unwrap();
        fs::write(dir.path().join("a.csv"), "id\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let dataset = produce(dir.path(), CsvOptions::default()).unwrap();
        assert_eq!(dataset.table_names().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_single_file_and_custom_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        fs::write(&path, "id;label\n1;<none>\n").unwrap();
        let options = CsvOptions {
            delimiter: b';',
            null_token: "<none>".into(),
            ..CsvOptions::default()
        };

        let dataset = produce(&path, options).unwrap();
        assert_eq!(dataset.table("items").unwrap().value(0, "label").unwrap(), Value::Null);
    }

    #[test]
    fn test_ragged_row_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,b\n1\n").unwrap();
        let result = produce(&path, CsvOptions::default());
        assert!(matches!(result, Err(CoreError::External(_))));
    }

    #[test]
    fn test_missing_table_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ORDERING_FILE), "absent\n").unwrap();
        assert!(produce(dir.path(), CsvOptions::default()).is_err());
    }

    #[test]
    fn test_round_trip_through_writer() {
        let parent = DefaultTable::with_rows(
            TableMetadata::new("parent", vec![Column::unknown("id"), Column::unknown("note")])
                .unwrap(),
            vec![
                vec![Value::from("1"), Value::from("has, comma")],
                vec![Value::from("2"), Value::Null],
            ],
        )
        .unwrap();
        let child = DefaultTable::with_rows(
            TableMetadata::new("child", vec![Column::unknown("parent_id")]).unwrap(),
            vec![vec![Value::from("1")]],
        )
        .unwrap();
        let original =
            DefaultDataSet::from_tables(vec![parent.into_ref(), child.into_ref()], false).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fixture");
        write_dataset(&original, &out, CsvOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(out.join(ORDERING_FILE)).unwrap(), "parent\nchild\n");

        let read_back = produce(&out, CsvOptions::default()).unwrap();
        assert_datasets_equal(&original, &read_back).unwrap();
    }

    #[test]
    fn test_writer_rejects_duplicate_tables() {
        use fixture_core::DataSetConsumer;

        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvDataSetWriter::new(dir.path(), CsvOptions::default());
        let metadata = TableMetadata::new("t", vec![Column::unknown("id")]).unwrap();
        writer.start_dataset().unwrap();
        writer.start_table(&metadata).unwrap();
        writer.row(&[Value::Int(1)]).unwrap();
        writer.end_table().unwrap();
        assert!(matches!(
            writer.start_table(&metadata.renamed("T")),
            Err(CoreError::DuplicateName(_))
        ));
        assert_eq!(writer.tables(), ["t"]);
    }

    #[test]
    fn test_from_config() {
        let config = FixtureConfig {
            null_token: "[NULL]".into(),
            ..FixtureConfig::default()
        };
        assert_eq!(CsvOptions::from_config(&config).null_token, "[NULL]");
    }
}
