//! Fixture file formats
//!
//! This crate provides producers that read fixture files into the
//! [`fixture_core`] event pipeline and a writer that stores any dataset back
//! to disk.

#![warn(missing_docs)]

mod error;
mod factory;

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "json")]
pub mod json;

pub mod common;

pub use common::FileFormat;
pub use error::{Error, Result};
pub use factory::{load_dataset, producer_for_path};

// Re-export core types
pub use fixture_core::{
    DataSet, DataSetConsumer, DataSetProducer, FixtureConfig,
    error::Result as CoreResult
};
