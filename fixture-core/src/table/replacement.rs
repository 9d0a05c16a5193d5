use std::sync::Arc;

use super::{Table, TableRef};
use crate::error::Result;
use crate::schema::TableMetadata;
use crate::value::Value;

/// Value substitutions applied when reading a table
///
/// Whole-value replacements are checked first; substring replacements only
/// apply to text values that had no whole-value match.
#[derive(Debug, Clone, Default)]
pub struct Replacements {
    values: Vec<(Value, Value)>,
    substrings: Vec<(String, String)>,
}

impl Replacements {
    /// Empty replacement set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value equal to `original`
    #[must_use]
    pub fn value(mut self, original: impl Into<Value>, replacement: impl Into<Value>) -> Self {
        self.values.push((original.into(), replacement.into()));
        self
    }

    /// Replace `original` inside text values
    #[must_use]
    pub fn substring(
        mut self,
        original: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.substrings.push((original.into(), replacement.into()));
        self
    }

    /// Apply the replacements to one value
    pub fn apply(&self, value: Value) -> Value {
        let exact = self.values.iter().find(|(original, _)| *original == value);
        if let Some((_, replacement)) = exact {
            return replacement.clone();
        }
        match value {
            Value::Text(text) if !self.substrings.is_empty() => Value::Text(
                self.substrings
                    .iter()
                    .fold(text, |acc, (from, to)| acc.replace(from.as_str(), to)),
            ),
            other => other,
        }
    }
}

/// Table view applying [`Replacements`] to every value read
pub struct ReplacementTable {
    inner: TableRef,
    replacements: Arc<Replacements>,
}

impl ReplacementTable {
    /// Wrap `inner`
    pub fn new(inner: TableRef, replacements: Arc<Replacements>) -> Self {
        Self {
            inner,
            replacements,
        }
    }
}

impl Table for ReplacementTable {
    fn metadata(&self) -> &TableMetadata {
        self.inner.metadata()
    }

    fn row_count(&self) -> Result<usize> {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        Ok(self.replacements.apply(self.inner.value(row, column)?))
    }
}
