//! Core traits, data structures, and algorithms for database fixtures
//!
//! This crate provides the tabular model that fixture tooling builds upon:
//! tables and datasets with case-aware table registries, forward-only and
//! cached access to database content, the producer/consumer event pipeline,
//! foreign key dependency ordering, and comparison of expected against
//! actual data.

#![warn(missing_docs)]

pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod memory;
pub mod operation;
pub mod registry;
pub mod schema;
pub mod search;
pub mod sink;
pub mod source;
pub mod table;
pub mod value;

// Re-export key types for convenience
pub use compare::{Comparison, Difference};
pub use config::{FixtureConfig, TableMode};
pub use dataset::{DataSet, DataSetRef, DefaultDataSet, TableIterator};
pub use error::{Error, Result};
pub use operation::DatabaseOperation;
pub use registry::OrderedTableNameMap;
pub use schema::{Column, DataType, TableMetadata};
pub use sink::{DataSetConsumer, RowSink};
pub use source::{DataSetProducer, RowCursor, RowSource};
pub use table::{DefaultTable, Table, TableRef};
pub use value::Value;

/// Foreign key ordering of tables
pub mod dependency {
    pub use crate::search::{ForeignKey, ForeignKeyProvider, TablesDependencyHelper};
}
