//! Turning differences into failures

use tracing::debug;

use super::{Difference, DifferenceKind};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// Builds the error raised for a failed comparison
pub trait FailureFactory: Send + Sync {
    /// Create the failure for `message`
    fn create_failure(
        &self,
        message: &str,
        expected: &str,
        actual: &str,
        differences: Vec<Difference>,
    ) -> Error;
}

/// Factory producing [`Error::ComparisonFailure`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFailureFactory;

impl FailureFactory for DefaultFailureFactory {
    fn create_failure(
        &self,
        message: &str,
        expected: &str,
        actual: &str,
        differences: Vec<Difference>,
    ) -> Error {
        Error::ComparisonFailure {
            message: message.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            differences,
        }
    }
}

/// Receives the differences a comparison finds
pub trait FailureHandler {
    /// Handle one difference; returning an error stops the comparison
    fn handle(
        &mut self,
        difference: Difference,
        expected: &dyn Table,
        actual: &dyn Table,
    ) -> Result<()>;

    /// Build the error for a structural mismatch
    fn fail(&self, message: &str, expected: &str, actual: &str) -> Error;

    /// Called once after the whole comparison
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Extra column values shown next to a difference
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalValue {
    /// Column name
    pub column: String,
    /// Value in the expected table, `None` if it has no such column
    pub expected: Option<Value>,
    /// Value in the actual table, `None` if it has no such column
    pub actual: Option<Value>,
}

/// Read the configured additional columns for the row of `difference`
pub fn additional_values(
    columns: &[String],
    difference: &Difference,
    expected: &dyn Table,
    actual: &dyn Table,
) -> Result<Vec<AdditionalValue>> {
    let DifferenceKind::Value { row, .. } = difference.kind else {
        return Ok(Vec::new());
    };
    let read = |table: &dyn Table, column: &str| -> Result<Option<Value>> {
        if table.metadata().has_column(column) {
            table.value(row, column).map(Some)
        } else {
            Ok(None)
        }
    };
    columns
        .iter()
        .map(|column| {
            Ok(AdditionalValue {
                column: column.clone(),
                expected: read(expected, column)?,
                actual: read(actual, column)?,
            })
        })
        .collect()
}

fn render_additional(values: &[AdditionalValue]) -> String {
    let render = |v: &Option<Value>| {
        v.as_ref()
            .map_or_else(|| "<no such column>".to_string(), |v| format!("<{v}>"))
    };
    let parts: Vec<String> = values
        .iter()
        .map(|v| {
            format!(
                "('{}': expected={}, actual={})",
                v.column,
                render(&v.expected),
                render(&v.actual)
            )
        })
        .collect();
    format!("Additional row info: {}", parts.join(", "))
}

/// Render a difference, with its additional values, as one message
pub fn render_difference(difference: &Difference) -> String {
    let mut message = difference.to_string();
    if !difference.additional.is_empty() {
        message.push_str(". ");
        message.push_str(&render_additional(&difference.additional));
    }
    message
}

/// Fails on the first difference
pub struct DefaultFailureHandler {
    additional_columns: Vec<String>,
    factory: Box<dyn FailureFactory>,
}

impl DefaultFailureHandler {
    /// Handler using [`DefaultFailureFactory`]
    pub fn new() -> Self {
        Self {
            additional_columns: Vec::new(),
            factory: Box::new(DefaultFailureFactory),
        }
    }

    /// Include these columns' values in failure messages
    #[must_use]
    pub fn with_additional_columns(mut self, columns: Vec<String>) -> Self {
        self.additional_columns = columns;
        self
    }

    /// Use another factory
    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn FailureFactory>) -> Self {
        self.factory = factory;
        self
    }
}

impl Default for DefaultFailureHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureHandler for DefaultFailureHandler {
    fn handle(
        &mut self,
        mut difference: Difference,
        expected: &dyn Table,
        actual: &dyn Table,
    ) -> Result<()> {
        difference.additional =
            additional_values(&self.additional_columns, &difference, expected, actual)?;
        let message = render_difference(&difference);
        let expected = difference.expected.to_string();
        let actual = difference.actual.to_string();
        Err(self
            .factory
            .create_failure(&message, &expected, &actual, vec![difference]))
    }

    fn fail(&self, message: &str, expected: &str, actual: &str) -> Error {
        self.factory.create_failure(message, expected, actual, Vec::new())
    }
}

/// Collects every difference and fails once at the end
pub struct DiffCollectingFailureHandler {
    differences: Vec<Difference>,
    additional_columns: Vec<String>,
    factory: Box<dyn FailureFactory>,
}

impl DiffCollectingFailureHandler {
    /// Handler using [`DefaultFailureFactory`]
    pub fn new() -> Self {
        Self {
            differences: Vec::new(),
            additional_columns: Vec::new(),
            factory: Box::new(DefaultFailureFactory),
        }
    }

    /// Include these columns' values in each difference
    #[must_use]
    pub fn with_additional_columns(mut self, columns: Vec<String>) -> Self {
        self.additional_columns = columns;
        self
    }

    /// Use another factory
    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn FailureFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Differences collected so far
    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }
}

impl Default for DiffCollectingFailureHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureHandler for DiffCollectingFailureHandler {
    fn handle(
        &mut self,
        mut difference: Difference,
        expected: &dyn Table,
        actual: &dyn Table,
    ) -> Result<()> {
        difference.additional =
            additional_values(&self.additional_columns, &difference, expected, actual)?;
        debug!(difference = %difference, "difference collected");
        self.differences.push(difference);
        Ok(())
    }

    fn fail(&self, message: &str, expected: &str, actual: &str) -> Error {
        self.factory.create_failure(message, expected, actual, Vec::new())
    }

    fn finish(&mut self) -> Result<()> {
        if self.differences.is_empty() {
            return Ok(());
        }
        let lines: Vec<String> = self.differences.iter().map(render_difference).collect();
        let message = format!(
            "{} difference(s) found:\n{}",
            self.differences.len(),
            lines.join("\n")
        );
        let expected: Vec<String> = self
            .differences
            .iter()
            .map(|d| d.expected.to_string())
            .collect();
        let actual: Vec<String> = self
            .differences
            .iter()
            .map(|d| d.actual.to_string())
            .collect();
        Err(self.factory.create_failure(
            &message,
            &expected.join(", "),
            &actual.join(", "),
            self.differences.clone(),
        ))
    }
}
