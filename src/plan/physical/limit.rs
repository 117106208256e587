use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{array::RecordBatch, datatypes::SchemaRef};

use crate::error::Result;

use super::plan::{format_exec, ExecutionPlan};

/// Skips `skip` rows, then keeps at most `fetch` rows.
#[derive(Debug)]
pub struct LimitExec {
    input: Arc<dyn ExecutionPlan>,
    skip: usize,
    fetch: Option<usize>,
}

impl LimitExec {
    pub fn new(input: Arc<dyn ExecutionPlan>, skip: usize, fetch: Option<usize>) -> Self {
        Self { input, skip, fetch }
    }
}

impl ExecutionPlan for LimitExec {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    fn children(&self) -> Vec<&dyn ExecutionPlan> {
        vec![self.input.as_ref()]
    }

    fn execute(&self) -> Result<RecordBatch> {
        let input = self.input.execute()?;
        let offset = self.skip.min(input.num_rows());
        let remaining = input.num_rows() - offset;
        let length = self.fetch.map_or(remaining, |fetch| fetch.min(remaining));

        Ok(input.slice(offset, length))
    }

    fn format(&self) -> String {
        format!("LimitExec: [skip: {}, fetch: {:?}]", self.skip, self.fetch)
    }
}

impl Display for LimitExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}
