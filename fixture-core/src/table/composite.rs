use super::{Table, TableRef};
use crate::error::{Error, Result};
use crate::schema::TableMetadata;
use crate::value::Value;

/// Several tables with the same columns read as one, end to end
pub struct CompositeTable {
    metadata: TableMetadata,
    tables: Vec<TableRef>,
}

impl CompositeTable {
    /// Concatenate `tables`, taking metadata from the first one
    pub fn new(tables: Vec<TableRef>) -> Result<Self> {
        let metadata = tables
            .first()
            .map(|t| t.metadata().clone())
            .ok_or_else(|| {
                Error::InvalidArgument("composite table needs at least one table".into())
            })?;
        Self::with_metadata(metadata, tables)
    }

    /// Concatenate `tables` under explicit metadata
    pub fn with_metadata(metadata: TableMetadata, tables: Vec<TableRef>) -> Result<Self> {
        if let Some(odd) = tables
            .iter()
            .find(|t| !t.metadata().has_same_columns(&metadata))
        {
            return Err(Error::InvalidArgument(format!(
                "table {} does not have the columns of {}",
                odd.name(),
                metadata.table_name()
            )));
        }
        Ok(Self { metadata, tables })
    }
}

impl Table for CompositeTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn row_count(&self) -> Result<usize> {
        self.tables.iter().map(|t| t.row_count()).sum()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value> {
        let mut offset = row;
        for table in &self.tables {
            let count = table.row_count()?;
            if offset < count {
                return table.value(offset, column);
            }
            offset -= count;
        }
        Err(Error::RowOutOfBounds {
            table: self.metadata.table_name().to_string(),
            row,
            available: row - offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::grid;

    #[test]
    fn test_composite_concatenates() {
        let table = CompositeTable::new(vec![
            grid("t", 2, 1).into_ref(),
            grid("t", 1, 1).into_ref(),
        ])
        .unwrap();
        assert_eq!(table.row_count().unwrap(), 3);
        assert_eq!(table.value(2, "c1").unwrap(), Value::Int(1));
        assert!(matches!(
            table.value(3, "c1"),
            Err(Error::RowOutOfBounds { available: 3, .. })
        ));
    }

    #[test]
    fn test_composite_rejects_mismatched_columns() {
        let result = CompositeTable::new(vec![
            grid("t", 1, 1).into_ref(),
            grid("t", 1, 2).into_ref(),
        ]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
