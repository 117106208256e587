use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{RecordBatch, RecordBatchOptions},
    datatypes::SchemaRef,
};
use itertools::Itertools;

use crate::{error::Result, expression::physical::expr::PhysicalExpression};

use super::plan::{format_exec, ExecutionPlan};

/// Evaluates one expression per output column.
#[derive(Debug)]
pub struct ProjectionExec {
    input: Arc<dyn ExecutionPlan>,
    schema: SchemaRef,
    expression: Vec<Arc<dyn PhysicalExpression>>,
}

impl ProjectionExec {
    pub fn new(
        input: Arc<dyn ExecutionPlan>,
        schema: SchemaRef,
        expression: Vec<Arc<dyn PhysicalExpression>>,
    ) -> Self {
        Self {
            input,
            schema,
            expression,
        }
    }
}

impl ExecutionPlan for ProjectionExec {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn children(&self) -> Vec<&dyn ExecutionPlan> {
        vec![self.input.as_ref()]
    }

    fn execute(&self) -> Result<RecordBatch> {
        let input = self.input.execute()?;
        let num_rows = input.num_rows();
        let columns = self
            .expression
            .iter()
            .map(|expr| expr.eval(&input)?.into_array(num_rows))
            .collect::<Result<Vec<_>>>()?;

        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        Ok(RecordBatch::try_new_with_options(
            self.schema.clone(),
            columns,
            &options,
        )?)
    }

    fn format(&self) -> String {
        format!("ProjectionExec: [{}]", self.expression.iter().join(", "))
    }
}

impl Display for ProjectionExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}
