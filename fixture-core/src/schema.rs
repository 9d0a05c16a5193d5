//! Table metadata: logical data types, columns and table schemas

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::fold_name;
use crate::value::Value;

/// Logical data type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type not resolved yet (e.g. parsed from a file without a schema)
    Unknown,

    /// Boolean
    Boolean,

    /// 16-bit signed integer
    SmallInt,

    /// 32-bit signed integer
    Integer,

    /// 64-bit signed integer
    BigInt,

    /// 32-bit floating point
    Real,

    /// 64-bit floating point
    Double,

    /// Exact numeric
    Decimal,

    /// Fixed-length character data
    Char,

    /// Variable-length character data
    Varchar,

    /// Large character data
    Clob,

    /// Date
    Date,

    /// Time of day
    Time,

    /// Timestamp without timezone
    Timestamp,

    /// Fixed or variable length binary
    Binary,

    /// Large binary data
    Blob,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl DataType {
    /// Map a driver type name to a logical type
    ///
    /// Unrecognised names map to [`DataType::Unknown`].
    pub fn from_sql_name(name: &str) -> DataType {
        let lower = name.trim().to_lowercase();
        let base = lower.split('(').next().unwrap_or("").trim();
        match base {
            "bool" | "boolean" | "bit" => DataType::Boolean,
            "smallint" | "int2" | "tinyint" => DataType::SmallInt,
            "int" | "integer" | "int4" | "mediumint" => DataType::Integer,
            "bigint" | "int8" => DataType::BigInt,
            "real" | "float4" => DataType::Real,
            "double" | "double precision" | "float" | "float8" => DataType::Double,
            "decimal" | "numeric" | "number" | "money" => DataType::Decimal,
            "char" | "character" | "nchar" | "bpchar" => DataType::Char,
            "varchar" | "character varying" | "nvarchar" | "varchar2" | "text" | "string" => {
                DataType::Varchar
            }
            "clob" | "longtext" | "ntext" | "longvarchar" => DataType::Clob,
            "date" => DataType::Date,
            "time" => DataType::Time,
            "timestamp" | "datetime" | "datetime2" | "timestamp without time zone" => {
                DataType::Timestamp
            }
            "binary" | "varbinary" | "bytea" => DataType::Binary,
            "blob" | "longblob" | "image" => DataType::Blob,
            _ => DataType::Unknown,
        }
    }

    /// Type naturally describing a value
    pub fn for_value(value: &Value) -> DataType {
        match value {
            Value::Null | Value::Text(_) => DataType::Unknown,
            Value::Bool(_) => DataType::Boolean,
            Value::Int(_) => DataType::BigInt,
            Value::Float(_) => DataType::Double,
            Value::Decimal(_) => DataType::Decimal,
            Value::Bytes(_) => DataType::Binary,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Check if this type is the unresolved sentinel
    pub fn is_unknown(self) -> bool {
        self == DataType::Unknown
    }

    /// Check if this type is numeric
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::SmallInt
                | DataType::Integer
                | DataType::BigInt
                | DataType::Real
                | DataType::Double
                | DataType::Decimal
        )
    }

    /// Check if this type holds character data
    pub fn is_text(self) -> bool {
        matches!(self, DataType::Char | DataType::Varchar | DataType::Clob)
    }

    /// Check if this type is a date or time type
    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }

    /// Coerce a value into this type's canonical representation
    ///
    /// `Null` is preserved for every type; [`DataType::Unknown`] returns the
    /// value unchanged.
    pub fn type_cast(self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let cast = match self {
            DataType::Unknown => Some(value.clone()),
            DataType::Boolean => cast_bool(value),
            DataType::SmallInt => cast_int(value, i64::from(i16::MIN), i64::from(i16::MAX)),
            DataType::Integer => cast_int(value, i64::from(i32::MIN), i64::from(i32::MAX)),
            DataType::BigInt => cast_int(value, i64::MIN, i64::MAX),
            DataType::Real | DataType::Double => cast_float(value),
            DataType::Decimal => cast_decimal(value),
            DataType::Char | DataType::Varchar | DataType::Clob => cast_text(value),
            DataType::Date => cast_date(value),
            DataType::Time => cast_time(value),
            DataType::Timestamp => cast_timestamp(value),
            DataType::Binary | DataType::Blob => cast_bytes(value),
        };
        cast.ok_or_else(|| Error::TypeCast {
            value: value.to_string(),
            data_type: self.to_string(),
        })
    }

    /// Compare two values under this type
    ///
    /// Both values are cast first; `Null` equals `Null` and sorts before
    /// any other value. [`DataType::Unknown`] infers a common type from the
    /// values themselves.
    pub fn compare(self, a: &Value, b: &Value) -> Result<Ordering> {
        match (a, b) {
            (Value::Null, Value::Null) => return Ok(Ordering::Equal),
            (Value::Null, _) => return Ok(Ordering::Less),
            (_, Value::Null) => return Ok(Ordering::Greater),
            _ => {}
        }

        if self.is_unknown() {
            let common = DataType::common_type(a, b);
            if common.is_unknown() {
                return Ok(a.natural_cmp(b));
            }
            // values that do not fit the inferred type still compare by text
            return Ok(common.compare(a, b).unwrap_or_else(|_| a.natural_cmp(b)));
        }

        let a = self.type_cast(a)?;
        let b = self.type_cast(b)?;
        Ok(a.natural_cmp(&b))
    }

    /// Type both values can be compared under, `Unknown` if none
    fn common_type(a: &Value, b: &Value) -> DataType {
        let ta = DataType::for_value(a);
        let tb = DataType::for_value(b);
        match (ta, tb) {
            (DataType::Unknown, DataType::Unknown) => DataType::Unknown,
            (DataType::Unknown, t) | (t, DataType::Unknown) => t,
            (x, y) if x == y => x,
            (x, y) if x.is_numeric() && y.is_numeric() => DataType::Decimal,
            (DataType::Date | DataType::Timestamp, DataType::Date | DataType::Timestamp) => {
                DataType::Timestamp
            }
            _ => DataType::Unknown,
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn cast_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(v) => Some(Value::Bool(*v)),
        Value::Int(v) => Some(Value::Bool(*v != 0)),
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Some(Value::Bool(true)),
            "false" | "f" | "0" | "no" | "n" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn cast_int(value: &Value, min: i64, max: i64) -> Option<Value> {
    let v = match value {
        Value::Int(v) => Some(*v),
        Value::Bool(v) => Some(i64::from(*v)),
        Value::Float(v) => Decimal::try_from(*v)
            .ok()
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_i64()),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                parse_decimal(s)
                    .filter(|d| d.fract().is_zero())
                    .and_then(|d| d.to_i64())
            })
        }
        _ => None,
    }?;
    (min..=max).contains(&v).then_some(Value::Int(v))
}

fn cast_float(value: &Value) -> Option<Value> {
    match value {
        Value::Text(s) => s.trim().parse::<f64>().ok().map(Value::Float),
        other => other.as_f64().map(Value::Float),
    }
}

fn cast_decimal(value: &Value) -> Option<Value> {
    let d = match value {
        Value::Text(s) => parse_decimal(s),
        other => other.as_decimal(),
    }?;
    Some(Value::Decimal(d.normalize()))
}

fn cast_text(value: &Value) -> Option<Value> {
    match value {
        Value::Text(s) => Some(Value::Text(s.clone())),
        Value::Bytes(b) => String::from_utf8(b.clone()).ok().map(Value::Text),
        other => Some(Value::Text(other.to_string())),
    }
}

fn cast_date(value: &Value) -> Option<Value> {
    match value {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::Timestamp(ts) => Some(Value::Date(ts.date())),
        Value::Text(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
                .map(Value::Date)
        }
        _ => None,
    }
}

fn cast_time(value: &Value) -> Option<Value> {
    match value {
        Value::Time(t) => Some(Value::Time(*t)),
        Value::Timestamp(ts) => Some(Value::Time(ts.time())),
        Value::Text(s) => {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .ok()
                .map(Value::Time)
        }
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn cast_timestamp(value: &Value) -> Option<Value> {
    match value {
        Value::Timestamp(ts) => Some(Value::Timestamp(*ts)),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(Value::Timestamp),
        Value::Text(s) => {
            let s = s.trim();
            parse_timestamp(s)
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(Value::Timestamp)
        }
        _ => None,
    }
}

fn cast_bytes(value: &Value) -> Option<Value> {
    match value {
        Value::Bytes(b) => Some(Value::Bytes(b.clone())),
        Value::Text(s) => Some(Value::Bytes(s.as_bytes().to_vec())),
        _ => None,
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Boolean => "BOOLEAN",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Real => "REAL",
            DataType::Double => "DOUBLE",
            DataType::Decimal => "DECIMAL",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::Clob => "CLOB",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Binary => "BINARY",
            DataType::Blob => "BLOB",
        };
        write!(f, "{name}")
    }
}

/// A column with a name, data type, nullability and optional default
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Name of the column
    pub name: String,

    /// Logical data type
    pub data_type: DataType,

    /// Whether the column accepts NULL
    pub nullable: bool,

    /// Default value, as declared by the schema
    pub default_value: Option<String>,
}

impl Column {
    /// Create a new column
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable,
            default_value: None,
        }
    }

    /// Create a nullable column of unknown type
    pub fn unknown(name: &str) -> Self {
        Self::new(name, DataType::Unknown, true)
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Get the name of this column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the data type of this column
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Check if this column is nullable
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}: {} (nullable)", self.name, self.data_type)
        } else {
            write!(f, "{}: {} (non-nullable)", self.name, self.data_type)
        }
    }
}

/// Metadata of one table: its name, ordered columns and primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    table_name: String,
    columns: Vec<Column>,
    primary_keys: Vec<String>,
    case_sensitive: bool,
    /// Folded column name -> position
    column_indices: HashMap<String, usize>,
}

impl TableMetadata {
    /// Create metadata with case-insensitive column names
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        Self::with_case_sensitivity(table_name, columns, false)
    }

    /// Create metadata under an explicit case policy
    ///
    /// Fails with [`Error::DuplicateName`] if two columns share a name under
    /// the policy.
    pub fn with_case_sensitivity(
        table_name: impl Into<String>,
        columns: Vec<Column>,
        case_sensitive: bool,
    ) -> Result<Self> {
        let table_name = table_name.into();
        let mut column_indices = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let key = fold_name(&column.name, case_sensitive).into_owned();
            if column_indices.insert(key, i).is_some() {
                return Err(Error::DuplicateName(format!(
                    "{}.{}",
                    table_name, column.name
                )));
            }
        }

        Ok(Self {
            table_name,
            columns,
            primary_keys: Vec::new(),
            case_sensitive,
            column_indices,
        })
    }

    /// Declare the primary key columns
    pub fn with_primary_keys<S: AsRef<str>>(mut self, keys: &[S]) -> Result<Self> {
        let mut primary_keys = Vec::with_capacity(keys.len());
        for key in keys {
            let index = self.column_index(key.as_ref())?;
            primary_keys.push(self.columns[index].name.clone());
        }
        self.primary_keys = primary_keys;
        Ok(self)
    }

    /// Copy of this metadata under another table name
    #[must_use]
    pub fn renamed(&self, table_name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.table_name = table_name.into();
        copy
    }

    /// Copy of this metadata keeping only the given column positions
    pub fn project(&self, indices: &[usize]) -> Result<Self> {
        let columns = indices
            .iter()
            .map(|&i| {
                self.columns.get(i).cloned().ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "column position {i} out of range for {}",
                        self.table_name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let keys: Vec<&str> = self
            .primary_keys
            .iter()
            .filter(|k| columns.iter().any(|c| &c.name == *k))
            .map(String::as_str)
            .collect();
        Self::with_case_sensitivity(self.table_name.clone(), columns, self.case_sensitive)?
            .with_primary_keys(keys.as_slice())
    }

    /// Get the table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by position
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_indices
            .get(fold_name(name, self.case_sensitive).as_ref())
            .copied()
            .ok_or_else(|| Error::no_such_column(&self.table_name, name))
    }

    /// Column by name
    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        let index = self.column_index(name)?;
        Ok(&self.columns[index])
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_indices
            .contains_key(fold_name(name, self.case_sensitive).as_ref())
    }

    /// Primary key column names
    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// Check if a primary key is declared
    pub fn has_primary_key(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    /// Whether column names are compared verbatim
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Check if both tables declare the same column names (any order)
    pub fn has_same_columns(&self, other: &TableMetadata) -> bool {
        self.columns.len() == other.columns.len()
            && self.columns.iter().all(|c| other.has_column(&c.name))
    }
}

impl fmt::Display for TableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Table {}: {} columns", self.table_name, self.columns.len())?;
        for column in &self.columns {
            writeln!(f, "  {column}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("VARCHAR(255)", DataType::Varchar)]
    #[test_case("int4", DataType::Integer)]
    #[test_case("timestamp without time zone", DataType::Timestamp)]
    #[test_case("NUMERIC(10, 2)", DataType::Decimal)]
    #[test_case("geometry", DataType::Unknown)]
    fn test_from_sql_name(name: &str, expected: DataType) {
        assert_eq!(DataType::from_sql_name(name), expected);
    }

    #[test]
    fn test_type_cast() {
        assert_eq!(
            DataType::Integer.type_cast(&Value::from(" 42 ")).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            DataType::Boolean.type_cast(&Value::from("TRUE")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            DataType::Varchar.type_cast(&Value::Int(7)).unwrap(),
            Value::from("7")
        );
        assert_eq!(
            DataType::Timestamp.type_cast(&Value::from("2024-01-02")).unwrap(),
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(DataType::Date.type_cast(&Value::Null).unwrap(), Value::Null);
        assert!(matches!(
            DataType::SmallInt.type_cast(&Value::Int(70_000)),
            Err(Error::TypeCast { .. })
        ));
        assert!(DataType::Integer.type_cast(&Value::from("abc")).is_err());
    }

    #[test]
    fn test_typed_compare() {
        assert_eq!(
            DataType::Integer
                .compare(&Value::from("10"), &Value::Int(10))
                .unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            DataType::Decimal
                .compare(&Value::from("1.50"), &Value::from("1.5"))
                .unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            DataType::Varchar
                .compare(&Value::from("a"), &Value::from("b"))
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            DataType::Integer.compare(&Value::Null, &Value::Int(0)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_unknown_compare_infers_type() {
        // text against a number compares numerically
        assert_eq!(
            DataType::Unknown
                .compare(&Value::from("2"), &Value::Int(2))
                .unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            DataType::Unknown
                .compare(&Value::Int(3), &Value::Float(3.0))
                .unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            DataType::Unknown
                .compare(&Value::from("x"), &Value::from("x"))
                .unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_metadata_column_lookup() {
        let meta = TableMetadata::new(
            "orders",
            vec![
                Column::new("id", DataType::Integer, false),
                Column::unknown("Total"),
            ],
        )
        .unwrap()
        .with_primary_keys(&["ID"])
        .unwrap();

        assert_eq!(meta.column_index("TOTAL").unwrap(), 1);
        assert_eq!(meta.primary_keys(), &["id".to_string()]);
        assert!(matches!(
            meta.column_index("missing"),
            Err(Error::NoSuchColumn { ref table, ref column }) if table == "orders" && column == "missing"
        ));
    }

    #[test]
    fn test_metadata_rejects_duplicate_columns() {
        let columns = vec![Column::unknown("a"), Column::unknown("A")];
        assert!(matches!(
            TableMetadata::new("t", columns.clone()),
            Err(Error::DuplicateName(_))
        ));
        assert!(TableMetadata::with_case_sensitivity("t", columns, true).is_ok());
    }
}
