use arrow::{array::RecordBatch, datatypes::SchemaRef};

use crate::error::Result;

use super::DataSource;

/// An in-memory table backed by a single [`RecordBatch`].
#[derive(Debug, Clone)]
pub struct MemTable {
    batch: RecordBatch,
}

impl MemTable {
    /// Creates a new [`MemTable`] instance.
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }
}

impl DataSource for MemTable {
    fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    fn scan(&self) -> Result<RecordBatch> {
        Ok(self.batch.clone())
    }
}
