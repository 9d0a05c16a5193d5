use super::{Table, TableRef};
use crate::error::{Error, Result};
use crate::registry::wildcard_match;
use crate::schema::TableMetadata;
use crate::value::Value;

/// Include/exclude rules over column names
///
/// A column passes when it matches an include pattern (or no include
/// patterns are set) and matches no exclude pattern. Patterns accept `*`
/// and `?` wildcards and are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilter {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl ColumnFilter {
    /// Filter that accepts every column
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include pattern
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Add an exclude pattern
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Whether `column` passes the filter
    pub fn accepts(&self, column: &str) -> bool {
        let matches = |patterns: &[String]| {
            patterns.iter().any(|p| wildcard_match(p, column, false))
        };
        (self.includes.is_empty() || matches(&self.includes)) && !matches(&self.excludes)
    }
}

/// View of a table restricted to the columns a [`ColumnFilter`] accepts
pub struct ColumnFilterTable {
    inner: TableRef,
    metadata: TableMetadata,
}

impl ColumnFilterTable {
    /// Wrap `inner`
    pub fn new(inner: TableRef, filter: &ColumnFilter) -> Result<Self> {
        let kept: Vec<usize> = inner
            .metadata()
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| filter.accepts(&c.name))
            .map(|(i, _)| i)
            .collect();
        let metadata = inner.metadata().project(&kept)?;
        Ok(Self { inner, metadata })
    }

    /// Wrap `inner`, dropping the named columns
    pub fn excluding(inner: TableRef, columns: &[&str]) -> Result<Self> {
        let filter = columns
            .iter()
            .fold(ColumnFilter::new(), |f, c| f.exclude(*c));
        Self::new(inner, &filter)
    }
}

impl Table for ColumnFilterTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn row_count(&self) -> Result<usize> {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        if !self.metadata.has_column(column) {
            return Err(Error::no_such_column(self.metadata.table_name(), column));
        }
        self.inner.value(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::grid;

    #[test]
    fn test_filter_rules() {
        let filter = ColumnFilter::new().include("C*").exclude("c2");
        assert!(filter.accepts("c1"));
        assert!(!filter.accepts("c2"));
        assert!(!filter.accepts("id"));
        assert!(ColumnFilter::new().accepts("anything"));
    }

    #[test]
    fn test_filtered_table_hides_columns() {
        let table = ColumnFilterTable::excluding(grid("t", 2, 3).into_ref(), &["c2"]).unwrap();
        assert_eq!(table.metadata().column_names(), vec!["c1", "c3"]);
        assert_eq!(table.value(1, "c3").unwrap(), Value::Int(13));
        assert!(matches!(
            table.value(0, "c2"),
            Err(Error::NoSuchColumn { .. })
        ));
    }
}
