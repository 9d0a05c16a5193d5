//! Choosing a producer for a fixture path

use std::path::Path;

use fixture_core::dataset::CachedDataSet;
use fixture_core::{DataSetProducer, FixtureConfig};
use tracing::debug;

use crate::common::FileFormat;
use crate::error::{Error, Result};

/// Producer for the fixture at `path`, chosen by [`FileFormat`]
pub fn producer_for_path(path: &Path, config: &FixtureConfig) -> Result<Box<dyn DataSetProducer>> {
    let format = FileFormat::detect_from_path(path)
        .ok_or_else(|| Error::Format(format!("unrecognised fixture format: {}", path.display())))?;
    debug!(path = %path.display(), ?format, "fixture format detected");

    match format {
        #[cfg(feature = "csv")]
        FileFormat::Csv => Ok(Box::new(crate::csv::CsvProducer::new(
            path,
            crate::csv::CsvOptions::from_config(config),
        ))),
        #[cfg(feature = "json")]
        FileFormat::Json => Ok(Box::new(crate::json::JsonProducer::from_path(path)?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::Format(format!("{other:?} support is not enabled"))),
    }
}

/// Load the fixture at `path` into memory
pub fn load_dataset(path: &Path, config: &FixtureConfig) -> Result<CachedDataSet> {
    config.validate()?;
    let mut producer = producer_for_path(path, config)?;
    Ok(CachedDataSet::from_producer(
        producer.as_mut(),
        config.case_sensitive_table_names,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture_core::DataSet;
    use std::fs;

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("fixture.json");
        fs::write(&json, r#"{"a": [{"id": 1}], "b": []}"#).unwrap();
        let csv = dir.path().join("a.csv");
        fs::write(&csv, "id\n1\n").unwrap();

        let config = FixtureConfig::default();
        assert_eq!(load_dataset(&json, &config).unwrap().table_names().unwrap(), vec!["a", "b"]);
        assert_eq!(load_dataset(&csv, &config).unwrap().table_names().unwrap(), vec!["a"]);
        assert_eq!(load_dataset(dir.path(), &config).unwrap().table_names().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_case_sensitive_config() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("fixture.json");
        fs::write(&json, r#"{"T": [{"id": 1}], "t": [{"id": 2}]}"#).unwrap();

        // case-insensitive names coalesce into one table
        let merged = load_dataset(&json, &FixtureConfig::default()).unwrap();
        assert_eq!(merged.table_names().unwrap(), vec!["T"]);
        assert_eq!(merged.table("t").unwrap().row_count().unwrap(), 2);

        let config = FixtureConfig {
            case_sensitive_table_names: true,
            ..FixtureConfig::default()
        };
        let dataset = load_dataset(&json, &config).unwrap();
        assert_eq!(dataset.table_names().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_format() {
        let config = FixtureConfig::default();
        assert!(matches!(
            producer_for_path(Path::new("fixture.xml"), &config),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FixtureConfig {
            search_depth: Some(0),
            ..FixtureConfig::default()
        };
        assert!(matches!(
            load_dataset(Path::new("fixture.json"), &config),
            Err(Error::Core(fixture_core::Error::Config(_)))
        ));
    }
}
