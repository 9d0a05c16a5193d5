//! Comparing expected tables and datasets against actual ones
//!
//! A [`Comparison`] walks two tables cell by cell, asking a
//! [`ValueComparer`] about every pair of values and reporting mismatches
//! to a [`FailureHandler`]. Structural mismatches (missing columns,
//! different table sets) fail immediately; value and row-count mismatches
//! go through the handler, which either fails fast or collects them.
//!
//! Tables whose row count is unknown (forward-only tables) are compared
//! in a single forward sweep.

mod comparer;
mod failure;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::FixtureConfig;
use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::registry::{fold_name, names_equal};
use crate::schema::DataType;
use crate::table::{row_count_if_known, ColumnFilterTable, Table, TableRef};
use crate::value::Value;

pub use comparer::{CompareContext, OrderingComparer, ToleranceComparer, ValueComparer};
pub use failure::{
    additional_values, render_difference, AdditionalValue, DefaultFailureFactory,
    DefaultFailureHandler, DiffCollectingFailureHandler, FailureFactory, FailureHandler,
};

/// What kind of mismatch a [`Difference`] records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DifferenceKind {
    /// The tables have different row counts
    RowCount,
    /// One cell differs
    Value {
        /// Row index
        row: usize,
        /// Column name
        column: String,
    },
}

/// One mismatch between an expected and an actual table
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// Kind and location
    pub kind: DifferenceKind,
    /// Expected table name
    pub expected_table: String,
    /// Actual table name
    pub actual_table: String,
    /// Expected value (the row count for [`DifferenceKind::RowCount`])
    pub expected: Value,
    /// Actual value (the row count for [`DifferenceKind::RowCount`])
    pub actual: Value,
    /// Explanation from the value comparer
    pub annotation: Option<String>,
    /// Extra column values attached by the failure handler
    pub additional: Vec<AdditionalValue>,
}

impl Difference {
    /// Row-count mismatch
    pub fn row_count(
        expected: &dyn Table,
        actual: &dyn Table,
        expected_rows: usize,
        actual_rows: usize,
    ) -> Self {
        Self {
            kind: DifferenceKind::RowCount,
            expected_table: expected.name().to_string(),
            actual_table: actual.name().to_string(),
            expected: Value::Int(i64::try_from(expected_rows).unwrap_or(i64::MAX)),
            actual: Value::Int(i64::try_from(actual_rows).unwrap_or(i64::MAX)),
            annotation: None,
            additional: Vec::new(),
        }
    }

    /// Cell mismatch
    pub fn value(
        ctx: &CompareContext<'_>,
        expected: Value,
        actual: Value,
        annotation: Option<String>,
    ) -> Self {
        Self {
            kind: DifferenceKind::Value {
                row: ctx.row,
                column: ctx.column.to_string(),
            },
            expected_table: ctx.expected_table.name().to_string(),
            actual_table: ctx.actual_table.name().to_string(),
            expected,
            actual,
            annotation,
            additional: Vec::new(),
        }
    }

    /// Row index of a cell mismatch
    pub fn row(&self) -> Option<usize> {
        match &self.kind {
            DifferenceKind::Value { row, .. } => Some(*row),
            DifferenceKind::RowCount => None,
        }
    }

    /// Column name of a cell mismatch
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            DifferenceKind::Value { column, .. } => Some(column),
            DifferenceKind::RowCount => None,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DifferenceKind::RowCount => write!(
                f,
                "row count (table={}) expected:<{}> but was:<{}>",
                self.expected_table, self.expected, self.actual
            )?,
            DifferenceKind::Value { row, column } => write!(
                f,
                "value (table={}, row={row}, col={column}) expected:<{}> but was:<{}>",
                self.expected_table, self.expected, self.actual
            )?,
        }
        if let Some(annotation) = &self.annotation {
            write!(f, " ({annotation})")?;
        }
        Ok(())
    }
}

/// Type used to compare a column present on both sides
fn comparison_type(expected: DataType, actual: DataType) -> DataType {
    match (expected, actual) {
        (DataType::Unknown, other) => other,
        (other, _) => other,
    }
}

/// Comparer set for one column of one table
#[derive(Debug, Clone)]
struct ColumnComparer {
    table: String,
    column: String,
    comparer: Arc<dyn ValueComparer>,
}

/// Comparison settings: which comparer applies to which column
#[derive(Debug, Clone)]
pub struct Comparison {
    default_comparer: Arc<dyn ValueComparer>,
    column_comparers: Vec<ColumnComparer>,
    case_sensitive: bool,
}

impl Default for Comparison {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparison {
    /// Compare every value for equality
    pub fn new() -> Self {
        Self {
            default_comparer: Arc::new(OrderingComparer::equal()),
            column_comparers: Vec::new(),
            case_sensitive: false,
        }
    }

    /// Comparison following the configured name case policy
    pub fn from_config(config: &FixtureConfig) -> Self {
        Self::new().with_case_sensitive_names(config.case_sensitive_table_names)
    }

    /// Match column comparer names verbatim instead of case-folded
    ///
    /// Dataset comparisons also match verbatim when both datasets are case
    /// sensitive.
    #[must_use]
    pub fn with_case_sensitive_names(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Comparer used where no column comparer is set
    #[must_use]
    pub fn with_default_comparer(mut self, comparer: Arc<dyn ValueComparer>) -> Self {
        self.default_comparer = comparer;
        self
    }

    /// Comparer for one column of one table, replacing any earlier one
    #[must_use]
    pub fn with_column_comparer(
        mut self,
        table: &str,
        column: &str,
        comparer: Arc<dyn ValueComparer>,
    ) -> Self {
        self.column_comparers.push(ColumnComparer {
            table: table.to_string(),
            column: column.to_string(),
            comparer,
        });
        self
    }

    fn comparer_for(&self, table: &str, column: &str, case_sensitive: bool) -> &dyn ValueComparer {
        self.column_comparers
            .iter()
            .rev()
            .find(|c| {
                names_equal(&c.table, table, case_sensitive)
                    && names_equal(&c.column, column, case_sensitive)
            })
            .map_or(self.default_comparer.as_ref(), |c| c.comparer.as_ref())
    }

    /// Compare two tables, then let the handler finish
    pub fn compare_tables(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        self.compare_table_contents(expected, actual, self.case_sensitive, handler)?;
        handler.finish()
    }

    /// Compare two datasets, then let the handler finish
    ///
    /// When both sides can list their tables, tables are matched by name;
    /// otherwise both are iterated in lockstep and matched by position.
    pub fn compare_datasets(
        &self,
        expected: &dyn DataSet,
        actual: &dyn DataSet,
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        match (expected.table_names(), actual.table_names()) {
            (Ok(expected_names), Ok(actual_names)) => {
                self.compare_by_name(expected, actual, &expected_names, &actual_names, handler)?;
            }
            (Err(e), _) | (_, Err(e)) if !e.is_unsupported() => return Err(e),
            _ => self.compare_in_lockstep(expected, actual, handler)?,
        }
        handler.finish()
    }

    fn compare_by_name(
        &self,
        expected: &dyn DataSet,
        actual: &dyn DataSet,
        expected_names: &[String],
        actual_names: &[String],
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        if expected_names.len() != actual_names.len() {
            return Err(handler.fail(
                "table count",
                &expected_names.len().to_string(),
                &actual_names.len().to_string(),
            ));
        }

        let case_sensitive = self.datasets_case_sensitive(expected, actual);
        let sorted = |names: &[String]| {
            let mut keys: Vec<String> = names
                .iter()
                .map(|n| fold_name(n, case_sensitive).into_owned())
                .collect();
            keys.sort();
            keys
        };
        if sorted(expected_names) != sorted(actual_names) {
            return Err(handler.fail(
                "tables",
                &expected_names.join(", "),
                &actual_names.join(", "),
            ));
        }

        for name in expected_names {
            let expected_table = expected.table(name)?;
            let actual_table = actual.table(name)?;
            self.compare_table_contents(
                expected_table.as_ref(),
                actual_table.as_ref(),
                case_sensitive,
                handler,
            )?;
        }
        Ok(())
    }

    fn datasets_case_sensitive(&self, expected: &dyn DataSet, actual: &dyn DataSet) -> bool {
        self.case_sensitive || (expected.is_case_sensitive() && actual.is_case_sensitive())
    }

    fn compare_in_lockstep(
        &self,
        expected: &dyn DataSet,
        actual: &dyn DataSet,
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let mut expected_iter = expected.iter()?;
        let mut actual_iter = actual.iter()?;
        let case_sensitive = self.datasets_case_sensitive(expected, actual);
        let mut tables = 0usize;
        loop {
            match (expected_iter.next()?, actual_iter.next()?) {
                (false, false) => return Ok(()),
                (true, true) => {
                    let expected_table = expected_iter.table()?;
                    let actual_table = actual_iter.table()?;
                    if !names_equal(expected_table.name(), actual_table.name(), case_sensitive) {
                        return Err(handler.fail(
                            &format!("table name at position {tables}"),
                            expected_table.name(),
                            actual_table.name(),
                        ));
                    }
                    self.compare_table_contents(
                        expected_table.as_ref(),
                        actual_table.as_ref(),
                        case_sensitive,
                        handler,
                    )?;
                    tables += 1;
                }
                (more_expected, _) => {
                    let (e, a) = if more_expected {
                        (format!("more than {tables}"), tables.to_string())
                    } else {
                        (tables.to_string(), format!("more than {tables}"))
                    };
                    return Err(handler.fail("table count", &e, &a));
                }
            }
        }
    }

    fn compare_table_contents(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        case_sensitive: bool,
        handler: &mut dyn FailureHandler,
    ) -> Result<()> {
        let expected_meta = expected.metadata();
        let actual_meta = actual.metadata();
        for column in expected_meta.columns() {
            if !actual_meta.has_column(&column.name) {
                return Err(Error::no_such_column(actual.name(), &column.name));
            }
        }
        for column in actual_meta.columns() {
            if !expected_meta.has_column(&column.name) {
                return Err(Error::no_such_column(expected.name(), &column.name));
            }
        }

        let counts = (row_count_if_known(expected)?, row_count_if_known(actual)?);
        let limit = match counts {
            (Some(e), Some(a)) if e != a => {
                debug!(table = %expected.name(), expected = e, actual = a, "row counts differ");
                let difference = Difference::row_count(expected, actual, e, a);
                return handler.handle(difference, expected, actual);
            }
            (Some(e), Some(_)) => Some(e),
            _ => None,
        };

        let columns: Vec<(&str, DataType)> = expected_meta
            .columns()
            .iter()
            .map(|c| {
                let actual_type = actual_meta
                    .column_by_name(&c.name)
                    .map_or(DataType::Unknown, |a| a.data_type);
                (c.name.as_str(), comparison_type(c.data_type, actual_type))
            })
            .collect();
        let Some(&(first_column, _)) = columns.first() else {
            return Ok(());
        };

        let mut row = 0usize;
        loop {
            if limit.is_some_and(|n| row >= n) {
                break;
            }
            if limit.is_none() {
                // read both sides until the end of data
                let has_expected = has_row(expected, row, first_column)?;
                let has_actual = has_row(actual, row, first_column)?;
                match (has_expected, has_actual) {
                    (true, true) => {}
                    (false, false) => break,
                    (true, false) => {
                        let total = row + count_rest(expected, row, first_column)?;
                        let difference = Difference::row_count(expected, actual, total, row);
                        return handler.handle(difference, expected, actual);
                    }
                    (false, true) => {
                        let total = row + count_rest(actual, row, first_column)?;
                        let difference = Difference::row_count(expected, actual, row, total);
                        return handler.handle(difference, expected, actual);
                    }
                }
            }

            for &(column, data_type) in &columns {
                let expected_value = expected.value(row, column)?;
                let actual_value = actual.value(row, column)?;
                let ctx = CompareContext {
                    expected_table: expected,
                    actual_table: actual,
                    row,
                    column,
                    data_type,
                };
                let comparer = self.comparer_for(expected.name(), column, case_sensitive);
                if let Some(annotation) = comparer.compare(&ctx, &expected_value, &actual_value)? {
                    let difference =
                        Difference::value(&ctx, expected_value, actual_value, Some(annotation));
                    handler.handle(difference, expected, actual)?;
                }
            }
            row += 1;
        }
        Ok(())
    }
}

/// Whether `table` has a row at `row`
fn has_row(table: &dyn Table, row: usize, column: &str) -> Result<bool> {
    match table.value(row, column) {
        Ok(_) => Ok(true),
        Err(e) if e.is_row_out_of_bounds() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Rows remaining from `row` onward, reading forward
fn count_rest(table: &dyn Table, mut row: usize, column: &str) -> Result<usize> {
    let start = row;
    while has_row(table, row, column)? {
        row += 1;
    }
    Ok(row - start)
}

/// Assert two tables are equal, failing on the first difference
pub fn assert_tables_equal(expected: &dyn Table, actual: &dyn Table) -> Result<()> {
    Comparison::new().compare_tables(expected, actual, &mut DefaultFailureHandler::new())
}

/// Assert two datasets are equal, failing on the first difference
pub fn assert_datasets_equal(expected: &dyn DataSet, actual: &dyn DataSet) -> Result<()> {
    Comparison::new().compare_datasets(expected, actual, &mut DefaultFailureHandler::new())
}

/// Compare two datasets with the configured name case policy and failure
/// handler
pub fn compare_datasets_with_config(
    expected: &dyn DataSet,
    actual: &dyn DataSet,
    config: &FixtureConfig,
) -> Result<()> {
    let mut handler = config.compare.failure_handler();
    Comparison::from_config(config).compare_datasets(expected, actual, handler.as_mut())
}

/// Assert two tables are equal after dropping `ignored` columns from both
pub fn assert_tables_ignoring_columns(
    expected: TableRef,
    actual: TableRef,
    ignored: &[&str],
) -> Result<()> {
    let expected = ColumnFilterTable::excluding(expected, ignored)?;
    let actual = ColumnFilterTable::excluding(actual, ignored)?;
    assert_tables_equal(&expected, &actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataSetRef, DefaultDataSet, ForwardOnlyDataSet};
    use crate::schema::{Column, TableMetadata};
    use crate::table::tests::grid;
    use crate::table::{DefaultTable, ForwardOnlyTable};
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    fn with_cell(mut table: DefaultTable, row: usize, column: &str, value: Value) -> DefaultTable {
        table.set_value(row, column, value).unwrap();
        table
    }

    #[test]
    fn test_equal_tables() {
        assert_tables_equal(&grid("t", 3, 2), &grid("t", 3, 2)).unwrap();
    }

    #[test]
    fn test_value_difference_message() {
        let actual = with_cell(grid("t", 2, 2), 1, "c2", Value::Int(99));
        let err = assert_tables_equal(&grid("t", 2, 2), &actual).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value (table=t, row=1, col=c2) expected:<12> but was:<99> (Actual value is not equal to expected value)"
        );
        assert_eq!(err.differences().len(), 1);
    }

    #[test]
    fn test_row_count_stops_table() {
        let err = assert_tables_equal(&grid("t", 2, 1), &grid("t", 3, 1)).unwrap_err();
        let differences = err.differences();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].kind, DifferenceKind::RowCount);
        assert_eq!(differences[0].expected, Value::Int(2));
        assert_eq!(differences[0].actual, Value::Int(3));
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let mut handler = DiffCollectingFailureHandler::new();
        let err = Comparison::new()
            .compare_tables(&grid("t", 1, 2), &grid("t", 1, 1), &mut handler)
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchColumn { ref column, .. } if column == "c2"));
        assert!(handler.differences().is_empty());
    }

    #[test]
    fn test_collecting_handler_reports_all() {
        let actual = with_cell(grid("t", 3, 2), 0, "c1", Value::Int(0));
        let actual = with_cell(actual, 2, "c2", Value::Null);
        let mut handler =
            DiffCollectingFailureHandler::new().with_additional_columns(vec!["c1".into()]);
        let err = Comparison::new()
            .compare_tables(&grid("t", 3, 2), &actual, &mut handler)
            .unwrap_err();

        assert_eq!(err.differences().len(), 2);
        assert_eq!(handler.differences().len(), 2);
        assert_eq!(handler.differences()[1].row(), Some(2));
        assert_eq!(handler.differences()[1].column(), Some("c2"));
        let additional = &handler.differences()[1].additional;
        assert_eq!(additional[0].actual, Some(Value::Int(21)));
        assert!(err.to_string().starts_with("2 difference(s) found"));
        let message = err.to_string();
        assert!(message.contains("Additional row info: ('c1': expected=<21>, actual=<21>)"));
    }

    #[test]
    fn test_typed_comparison_coerces_text() {
        let meta = TableMetadata::new("t", vec![Column::unknown("c1")]).unwrap();
        let expected = DefaultTable::with_rows(meta, vec![vec![Value::from("1")]]).unwrap();
        // actual column typed Integer, expected untyped: compare as Integer
        assert_tables_equal(&expected, &grid("t", 1, 1)).unwrap();
    }

    #[test]
    fn test_column_comparer_override() {
        let comparison = Comparison::new().with_column_comparer(
            "T",
            "C2",
            Arc::new(ToleranceComparer::new(Decimal::ONE)),
        );
        let mut handler = DefaultFailureHandler::new();

        let within = with_cell(grid("t", 1, 2), 0, "c2", Value::Int(3));
        comparison.compare_tables(&grid("t", 1, 2), &within, &mut handler).unwrap();

        let outside = with_cell(grid("t", 1, 2), 0, "c2", Value::Int(4));
        let err = comparison
            .compare_tables(&grid("t", 1, 2), &outside, &mut handler)
            .unwrap_err();
        assert!(err.to_string().contains("differs by 2, tolerance is 1"));

        // other columns keep the default equality comparer
        let other = with_cell(grid("t", 1, 2), 0, "c1", Value::Int(2));
        assert!(comparison.compare_tables(&grid("t", 1, 2), &other, &mut handler).is_err());
    }

    #[test]
    fn test_column_comparer_names_follow_case_policy() {
        let actual = with_cell(grid("t", 1, 2), 0, "c2", Value::Int(3));
        let tolerance: Arc<dyn ValueComparer> = Arc::new(ToleranceComparer::new(Decimal::ONE));
        let folded = Comparison::new().with_column_comparer("T", "c2", Arc::clone(&tolerance));
        let verbatim = folded.clone().with_case_sensitive_names(true);

        let mut handler = DefaultFailureHandler::new();
        folded.compare_tables(&grid("t", 1, 2), &actual, &mut handler).unwrap();
        assert!(verbatim.compare_tables(&grid("t", 1, 2), &actual, &mut handler).is_err());

        let dataset = |table: DefaultTable, case_sensitive| {
            DefaultDataSet::from_tables(vec![table.into_ref()], case_sensitive).unwrap()
        };
        let expected = dataset(grid("t", 1, 2), false);
        let same_case = dataset(actual.clone(), false);
        folded.compare_datasets(&expected, &same_case, &mut handler).unwrap();

        let (expected, exact_case) = (dataset(grid("t", 1, 2), true), dataset(actual, true));
        let result = folded.compare_datasets(&expected, &exact_case, &mut handler);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_cell_change_is_single_difference() {
        let actual = with_cell(grid("t", 3, 3), 1, "c2", Value::Int(-1));
        let mut handler = DiffCollectingFailureHandler::new();
        let err = Comparison::new()
            .compare_tables(&grid("t", 3, 3), &actual, &mut handler)
            .unwrap_err();

        assert_eq!(err.differences().len(), 1);
        let differences = handler.differences();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].row(), Some(1));
        assert_eq!(differences[0].column(), Some("c2"));
        assert_eq!(differences[0].expected, Value::Int(12));
        assert_eq!(differences[0].actual, Value::Int(-1));
    }

    /// Table recording which rows were read
    struct RecordingTable {
        inner: DefaultTable,
        rows_read: Mutex<Vec<usize>>,
    }

    impl Table for RecordingTable {
        fn metadata(&self) -> &TableMetadata {
            self.inner.metadata()
        }

        fn row_count(&self) -> Result<usize> {
            self.inner.row_count()
        }

        fn value(&self, row: usize, column: &str) -> Result<Value> {
            self.rows_read.lock().unwrap().push(row);
            self.inner.value(row, column)
        }
    }

    #[test]
    fn test_row_count_checked_before_values() {
        let expected = RecordingTable {
            inner: grid("t", 2, 2),
            rows_read: Mutex::new(Vec::new()),
        };
        let mut handler = DiffCollectingFailureHandler::new();
        let err = Comparison::new()
            .compare_tables(&expected, &grid("t", 3, 2), &mut handler)
            .unwrap_err();

        assert_eq!(err.differences().len(), 1);
        assert_eq!(handler.differences()[0].kind, DifferenceKind::RowCount);
        let rows_read = expected.rows_read.lock().unwrap();
        assert!(!rows_read.contains(&2));
        assert!(rows_read.is_empty());
    }

    #[test]
    fn test_compare_with_config() {
        let actual = with_cell(grid("t", 2, 2), 0, "c1", Value::Int(0));
        let actual = with_cell(actual, 1, "c2", Value::Int(0));
        let expected =
            DefaultDataSet::from_tables(vec![grid("t", 2, 2).into_ref()], false).unwrap();
        let actual = DefaultDataSet::from_tables(vec![actual.into_ref()], false).unwrap();

        let mut config = FixtureConfig::default();
        let err = compare_datasets_with_config(&expected, &actual, &config).unwrap_err();
        assert_eq!(err.differences().len(), 1);

        config.compare.collect_all = true;
        let err = compare_datasets_with_config(&expected, &actual, &config).unwrap_err();
        assert_eq!(err.differences().len(), 2);

        compare_datasets_with_config(&expected, &expected, &config).unwrap();
    }

    #[test]
    fn test_ignoring_columns() {
        let actual = with_cell(grid("t", 2, 2), 0, "c2", Value::Null);
        assert!(assert_tables_equal(&grid("t", 2, 2), &actual).is_err());
        assert_tables_ignoring_columns(grid("t", 2, 2).into_ref(), actual.into_ref(), &["C2"])
            .unwrap();
    }

    #[test]
    fn test_forward_only_row_count_sweep() {
        let expected = ForwardOnlyTable::new(grid("t", 2, 1).into_ref());
        let actual = ForwardOnlyTable::new(grid("t", 4, 1).into_ref());
        let err = assert_tables_equal(&expected, &actual).unwrap_err();
        let differences = err.differences();
        assert_eq!(differences[0].expected, Value::Int(2));
        assert_eq!(differences[0].actual, Value::Int(4));

        let same = ForwardOnlyTable::new(grid("t", 2, 1).into_ref());
        assert_tables_equal(&grid("t", 2, 1), &same).unwrap();
    }

    fn named(names: &[&str], rows: usize) -> DefaultDataSet {
        let tables = names.iter().map(|n| grid(n, rows, 1).into_ref()).collect();
        DefaultDataSet::from_tables(tables, false).unwrap()
    }

    #[test]
    fn test_datasets_matched_by_name() {
        let expected = named(&["a", "b"], 1);
        assert_datasets_equal(&expected, &named(&["B", "A"], 1)).unwrap();

        let err = assert_datasets_equal(&expected, &named(&["a"], 1)).unwrap_err();
        assert!(
            matches!(err, Error::ComparisonFailure { ref message, .. } if message == "table count")
        );

        assert!(assert_datasets_equal(&expected, &named(&["a", "c"], 1)).is_err());
    }

    #[test]
    fn test_datasets_in_lockstep_when_forward_only() {
        let expected = named(&["a", "b"], 2);
        let inner: DataSetRef = Arc::new(named(&["a", "b"], 2));
        let actual = ForwardOnlyDataSet::new(inner);
        assert_datasets_equal(&expected, &actual).unwrap();

        let reordered: DataSetRef = Arc::new(named(&["b", "a"], 2));
        let actual = ForwardOnlyDataSet::new(reordered);
        assert!(assert_datasets_equal(&expected, &actual).is_err());
    }
}
