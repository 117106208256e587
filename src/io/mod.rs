use std::fmt::Debug;

use arrow::{array::RecordBatch, datatypes::SchemaRef};

use crate::error::Result;

pub mod csv;
pub mod fetch;
pub mod memory;

/// A source of rows that a [`crate::plan::logical::scan::Scan`] can read.
pub trait DataSource: Debug {
    /// A reference-counted [`arrow::datatypes::Schema`].
    fn schema(&self) -> SchemaRef;

    /// Reads all rows of the source.
    fn scan(&self) -> Result<RecordBatch>;
}
