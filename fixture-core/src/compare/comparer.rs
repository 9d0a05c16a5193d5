//! Per-cell value comparers

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

use crate::error::Result;
use crate::schema::DataType;
use crate::table::Table;
use crate::value::Value;

/// Where a cell comparison happens
pub struct CompareContext<'a> {
    /// Expected table
    pub expected_table: &'a dyn Table,
    /// Actual table
    pub actual_table: &'a dyn Table,
    /// Row index
    pub row: usize,
    /// Column name
    pub column: &'a str,
    /// Type the values are coerced to before comparing
    pub data_type: DataType,
}

/// Decides whether an actual cell value is acceptable
pub trait ValueComparer: Send + Sync + fmt::Debug {
    /// `None` when the values match, otherwise a short explanation
    fn compare(
        &self,
        ctx: &CompareContext<'_>,
        expected: &Value,
        actual: &Value,
    ) -> Result<Option<String>>;
}

/// Accepts the actual value when its ordering relative to the expected
/// value passes a predicate
#[derive(Clone, Copy)]
pub struct OrderingComparer {
    accept: fn(Ordering) -> bool,
    description: &'static str,
}

impl fmt::Debug for OrderingComparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderingComparer")
            .field("description", &self.description)
            .finish()
    }
}

impl OrderingComparer {
    /// Actual equals expected
    pub fn equal() -> Self {
        Self {
            accept: Ordering::is_eq,
            description: "equal to",
        }
    }

    /// Actual differs from expected
    pub fn not_equal() -> Self {
        Self {
            accept: Ordering::is_ne,
            description: "not equal to",
        }
    }

    /// Actual is greater than expected
    pub fn greater_than() -> Self {
        Self {
            accept: Ordering::is_gt,
            description: "greater than",
        }
    }

    /// Actual is greater than or equal to expected
    pub fn greater_or_equal() -> Self {
        Self {
            accept: Ordering::is_ge,
            description: "greater than or equal to",
        }
    }

    /// Actual is less than expected
    pub fn less_than() -> Self {
        Self {
            accept: Ordering::is_lt,
            description: "less than",
        }
    }

    /// Actual is less than or equal to expected
    pub fn less_or_equal() -> Self {
        Self {
            accept: Ordering::is_le,
            description: "less than or equal to",
        }
    }
}

impl Default for OrderingComparer {
    fn default() -> Self {
        Self::equal()
    }
}

impl ValueComparer for OrderingComparer {
    fn compare(
        &self,
        ctx: &CompareContext<'_>,
        expected: &Value,
        actual: &Value,
    ) -> Result<Option<String>> {
        let ordering = ctx.data_type.compare(actual, expected)?;
        if (self.accept)(ordering) {
            Ok(None)
        } else {
            Ok(Some(format!(
                "Actual value is not {} expected value",
                self.description
            )))
        }
    }
}

/// Accepts numeric values within an absolute tolerance of the expected one
#[derive(Debug, Clone, Copy)]
pub struct ToleranceComparer {
    tolerance: Decimal,
}

impl ToleranceComparer {
    /// Accept `|actual - expected| <= tolerance`
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }
}

impl ValueComparer for ToleranceComparer {
    fn compare(
        &self,
        _ctx: &CompareContext<'_>,
        expected: &Value,
        actual: &Value,
    ) -> Result<Option<String>> {
        match (expected.is_null(), actual.is_null()) {
            (true, true) => return Ok(None),
            (true, false) | (false, true) => {
                return Ok(Some("Actual value is not within tolerance of expected value".into()))
            }
            (false, false) => {}
        }

        let to_decimal = |v: &Value| -> Result<Decimal> {
            match DataType::Decimal.type_cast(v)? {
                Value::Decimal(d) => Ok(d),
                other => Ok(other.as_decimal().unwrap_or_default()),
            }
        };
        let difference = (to_decimal(actual)? - to_decimal(expected)?).abs();
        if difference <= self.tolerance {
            Ok(None)
        } else {
            Ok(Some(format!(
                "Actual value differs by {difference}, tolerance is {}",
                self.tolerance
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::grid;
    use test_case::test_case;

    fn check(
        comparer: &dyn ValueComparer,
        data_type: DataType,
        expected: Value,
        actual: Value,
    ) -> Option<String> {
        let table = grid("t", 1, 1);
        let ctx = CompareContext {
            expected_table: &table,
            actual_table: &table,
            row: 0,
            column: "c1",
            data_type,
        };
        comparer.compare(&ctx, &expected, &actual).unwrap()
    }

    #[test_case(OrderingComparer::equal(), 5, 5, true ; "equal accepts")]
    #[test_case(OrderingComparer::equal(), 5, 6, false ; "equal rejects")]
    #[test_case(OrderingComparer::not_equal(), 5, 6, true ; "not equal accepts")]
    #[test_case(OrderingComparer::greater_than(), 5, 6, true ; "greater accepts")]
    #[test_case(OrderingComparer::greater_than(), 5, 5, false ; "greater rejects equal")]
    #[test_case(OrderingComparer::greater_or_equal(), 5, 5, true ; "greater or equal accepts equal")]
    #[test_case(OrderingComparer::less_than(), 5, 4, true ; "less accepts")]
    #[test_case(OrderingComparer::less_or_equal(), 5, 6, false ; "less or equal rejects")]
    fn test_ordering_comparers(
        comparer: OrderingComparer,
        expected: i64,
        actual: i64,
        accepted: bool,
    ) {
        let result = check(
            &comparer,
            DataType::Integer,
            Value::Int(expected),
            Value::Int(actual),
        );
        assert_eq!(result.is_none(), accepted);
    }

    #[test]
    fn test_equal_coerces_through_type() {
        let result = check(
            &OrderingComparer::equal(),
            DataType::Integer,
            Value::from("42"),
            Value::Int(42),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_tolerance() {
        let comparer = ToleranceComparer::new(Decimal::new(5, 2));
        let within = |expected, actual| {
            check(&comparer, DataType::Unknown, expected, actual).is_none()
        };
        assert!(within(Value::from("1.00"), Value::Float(1.04)));
        assert!(!within(Value::from("1.00"), Value::Float(1.06)));
        assert!(within(Value::Null, Value::Null));
        assert!(!within(Value::Null, Value::Int(1)));
    }
}
