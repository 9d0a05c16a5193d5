//! Configuration for fixture loading, search and comparison

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compare::{DefaultFailureHandler, DiffCollectingFailureHandler, FailureHandler};
use crate::error::{Error, Result};

/// How tables read from a [`RowSource`](crate::source::RowSource) are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableMode {
    /// Read every row into memory on first access
    #[default]
    Cached,

    /// Stream rows straight from the cursor
    ForwardOnly,
}

/// Settings for comparisons
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Collect every difference instead of failing on the first one
    pub collect_all: bool,

    /// Columns whose values are added to failure messages
    pub additional_columns: Vec<String>,
}

impl CompareConfig {
    /// Failure handler matching these settings
    pub fn failure_handler(&self) -> Box<dyn FailureHandler> {
        let columns = self.additional_columns.clone();
        if self.collect_all {
            let handler = DiffCollectingFailureHandler::new();
            Box::new(handler.with_additional_columns(columns))
        } else {
            let handler = DefaultFailureHandler::new();
            Box::new(handler.with_additional_columns(columns))
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Compare table names verbatim instead of case-folded
    pub case_sensitive_table_names: bool,

    /// Table mode for database-backed datasets
    pub table_mode: TableMode,

    /// Maximum recursion depth of dependency searches, unbounded when `None`
    pub search_depth: Option<usize>,

    /// Text read from fixture files as NULL
    pub null_token: String,

    /// Comparison settings
    pub compare: CompareConfig,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            case_sensitive_table_names: false,
            table_mode: TableMode::Cached,
            search_depth: None,
            null_token: "null".to_string(),
            compare: CompareConfig::default(),
        }
    }
}

impl FixtureConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FixtureConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.search_depth == Some(0) {
            return Err(Error::Config("search_depth must be at least 1".into()));
        }
        if self.null_token.is_empty() {
            return Err(Error::Config("null_token must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = FixtureConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FixtureConfig::default());
        assert_eq!(config.null_token, "null");
        assert_eq!(config.table_mode, TableMode::Cached);
    }

    #[test]
    fn test_partial_document() {
        let config = FixtureConfig::from_json_str(
            r#"{"table_mode": "forward_only", "search_depth": 3, "compare": {"collect_all": true}}"#,
        )
        .unwrap();
        assert_eq!(config.table_mode, TableMode::ForwardOnly);
        assert_eq!(config.search_depth, Some(3));
        assert!(config.compare.collect_all);
        assert!(config.compare.additional_columns.is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            FixtureConfig::from_json_str(r#"{"search_depth": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FixtureConfig::from_json_str(r#"{"null_token": ""}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FixtureConfig::from_json_str("{not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_failure_handler_follows_collect_all() {
        use crate::compare::Difference;
        use crate::table::tests::grid;

        let (expected, actual) = (grid("t", 1, 1), grid("t", 2, 1));
        let difference = || Difference::row_count(&expected, &actual, 1, 2);

        let mut fail_fast = CompareConfig::default().failure_handler();
        assert!(fail_fast.handle(difference(), &expected, &actual).is_err());

        let collect = CompareConfig {
            collect_all: true,
            ..CompareConfig::default()
        };
        let mut collecting = collect.failure_handler();
        collecting.handle(difference(), &expected, &actual).unwrap();
        collecting.handle(difference(), &expected, &actual).unwrap();
        let err = collecting.finish().unwrap_err();
        assert_eq!(err.differences().len(), 2);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"case_sensitive_table_names": true}}"#).unwrap();
        let config = FixtureConfig::from_path(file.path()).unwrap();
        assert!(config.case_sensitive_table_names);
    }
}
