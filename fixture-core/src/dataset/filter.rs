//! Table filters used by [`FilteredDataSet`](super::FilteredDataSet)

use std::collections::HashSet;

use crate::error::Result;
use crate::registry::{fold_name, wildcard_match};

/// Decides which tables of a dataset are visible
pub trait TableFilter: Send + Sync {
    /// Whether `table_name` passes the filter
    fn accepts(&self, table_name: &str) -> Result<bool>;

    /// Explicit table order, `None` to keep the dataset's own order
    fn sequence(&self) -> Option<&[String]> {
        None
    }
}

/// Filter that exposes an explicit list of tables in the listed order
#[derive(Debug, Clone)]
pub struct SequenceTableFilter {
    names: Vec<String>,
    keys: HashSet<String>,
    case_sensitive: bool,
}

impl SequenceTableFilter {
    /// Create a filter over `names`
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, case_sensitive: bool) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let keys = names
            .iter()
            .map(|n| fold_name(n, case_sensitive).into_owned())
            .collect();
        Self {
            names,
            keys,
            case_sensitive,
        }
    }

    /// Table names in filter order
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl TableFilter for SequenceTableFilter {
    fn accepts(&self, table_name: &str) -> Result<bool> {
        Ok(self
            .keys
            .contains(fold_name(table_name, self.case_sensitive).as_ref()))
    }

    fn sequence(&self) -> Option<&[String]> {
        Some(&self.names)
    }
}

/// Filter accepting tables that match any of a set of wildcard patterns
#[derive(Debug, Clone, Default)]
pub struct IncludeTableFilter {
    patterns: Vec<String>,
}

impl IncludeTableFilter {
    /// Create a filter from `*`/`?` patterns, matched case-insensitively
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableFilter for IncludeTableFilter {
    fn accepts(&self, table_name: &str) -> Result<bool> {
        Ok(self
            .patterns
            .iter()
            .any(|p| wildcard_match(p, table_name, false)))
    }
}

/// Filter rejecting tables that match any of a set of wildcard patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludeTableFilter {
    patterns: Vec<String>,
}

impl ExcludeTableFilter {
    /// Create a filter from `*`/`?` patterns, matched case-insensitively
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableFilter for ExcludeTableFilter {
    fn accepts(&self, table_name: &str) -> Result<bool> {
        Ok(!self
            .patterns
            .iter()
            .any(|p| wildcard_match(p, table_name, false)))
    }
}

/// Filter backed by a closure
pub struct PredicateTableFilter<F> {
    predicate: F,
}

impl<F> PredicateTableFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    /// Accept the tables for which `predicate` returns true
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> TableFilter for PredicateTableFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, table_name: &str) -> Result<bool> {
        Ok((self.predicate)(table_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_filter() {
        let filter = SequenceTableFilter::new(["b", "a"], false);
        assert!(filter.accepts("B").unwrap());
        assert!(!filter.accepts("c").unwrap());
        assert_eq!(filter.sequence().unwrap(), ["b", "a"]);

        let strict = SequenceTableFilter::new(["b"], true);
        assert!(!strict.accepts("B").unwrap());
    }

    #[test]
    fn test_pattern_filters() {
        let include = IncludeTableFilter::new(["ORD*", "customer"]);
        assert!(include.accepts("orders").unwrap());
        assert!(include.accepts("CUSTOMER").unwrap());
        assert!(!include.accepts("audit").unwrap());

        let exclude = ExcludeTableFilter::new(["*_log"]);
        assert!(!exclude.accepts("audit_log").unwrap());
        assert!(exclude.accepts("orders").unwrap());
        assert!(exclude.sequence().is_none());

        let predicate = PredicateTableFilter::new(|name: &str| name.len() < 4);
        assert!(predicate.accepts("abc").unwrap());
        assert!(!predicate.accepts("abcd").unwrap());
    }
}
