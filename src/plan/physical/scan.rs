use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use tracing::debug;

use crate::{error::Result, io::DataSource};

use super::plan::{format_exec, ExecutionPlan};

/// Reads every row of a registered [`DataSource`].
#[derive(Debug)]
pub struct ScanExec {
    name: String,
    source: Arc<dyn DataSource>,
}

impl ScanExec {
    /// Creates a new [`ScanExec`] instance.
    pub fn new(name: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

impl ExecutionPlan for ScanExec {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.source.schema()
    }

    fn children(&self) -> Vec<&dyn ExecutionPlan> {
        vec![]
    }

    fn execute(&self) -> Result<RecordBatch> {
        let batch = self.source.scan()?;
        debug!(table = %self.name, rows = batch.num_rows(), "scanned table");
        Ok(batch)
    }

    fn format(&self) -> String {
        format!("ScanExec: {}", self.name)
    }
}

impl Display for ScanExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}
