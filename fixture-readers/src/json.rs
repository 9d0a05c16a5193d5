//! JSON fixture documents
//!
//! A document is an object mapping each table name to an array of row
//! objects:
//!
//! ```json
//! { "customers": [ { "id": 1, "name": "Alice" } ], "orders": [] }
//! ```
//!
//! Tables are produced in document order. A table's columns are the union
//! of its rows' keys in first-seen order; keys a row lacks read as NULL.

use std::fs;
use std::path::Path;

use fixture_core::schema::Column;
use fixture_core::{DataSetConsumer, DataSetProducer, TableMetadata, Value};
use indexmap::IndexSet;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{Error, Result};

/// Produces a dataset from a JSON document
pub struct JsonProducer {
    document: Map<String, JsonValue>,
}

impl JsonProducer {
    /// Parse a document
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str(json)? {
            JsonValue::Object(document) => Ok(Self { document }),
            _ => Err(Error::Format("fixture document must be an object".into())),
        }
    }

    /// Read and parse a document file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    fn produce_table(
        name: &str,
        rows: &JsonValue,
        consumer: &mut dyn DataSetConsumer,
    ) -> Result<()> {
        let rows = rows
            .as_array()
            .ok_or_else(|| Error::Format(format!("table {name} must be an array of rows")))?;
        let rows = rows
            .iter()
            .map(|row| {
                row.as_object()
                    .ok_or_else(|| Error::Format(format!("rows of table {name} must be objects")))
            })
            .collect::<Result<Vec<_>>>()?;

        let columns: IndexSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let metadata =
            TableMetadata::new(name, columns.iter().map(|c| Column::unknown(c)).collect())?;

        consumer.start_table(&metadata)?;
        for row in &rows {
            let values = columns
                .iter()
                .map(|column| match row.get(*column) {
                    Some(value) => to_value(name, value),
                    None => Ok(Value::Null),
                })
                .collect::<Result<Vec<_>>>()?;
            consumer.row(&values)?;
        }
        consumer.end_table()?;
        debug!(table = name, rows = rows.len(), "json table produced");
        Ok(())
    }
}

/// Cell value for a JSON scalar
fn to_value(table: &str, value: &JsonValue) -> Result<Value> {
    Ok(match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::Text(n.to_string()),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            return Err(Error::Format(format!("nested value in table {table}")))
        }
    })
}

impl DataSetProducer for JsonProducer {
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> fixture_core::Result<()> {
        consumer.start_dataset()?;
        for (name, rows) in &self.document {
            Self::produce_table(name, rows, consumer)?;
        }
        consumer.end_dataset()
    }
}
