use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{AsArray, RecordBatch},
    compute::filter_record_batch,
    datatypes::{DataType, SchemaRef},
};
use snafu::location;
use tracing::trace;

use crate::{
    error::{Error, Result},
    expression::physical::expr::PhysicalExpression,
};

use super::plan::{format_exec, ExecutionPlan};

/// Represents a filter execution plan in a query.
#[derive(Debug)]
pub struct FilterExec {
    /// The input [`ExecutionPlan`].
    input: Arc<dyn ExecutionPlan>,
    /// The predicate expression used to filter rows.
    predicate: Arc<dyn PhysicalExpression>,
}

impl FilterExec {
    /// Attempts to create a new [`FilterExec`] instance from specified (boolean) `predicate`.
    pub fn try_new(
        input: Arc<dyn ExecutionPlan>,
        predicate: Arc<dyn PhysicalExpression>,
    ) -> Result<Self> {
        if predicate.data_type(&input.schema())? != DataType::Boolean {
            return Err(Error::InvalidData {
                message: format!(
                    "Cannot create filter with non-boolean predicate '{}'",
                    predicate
                ),
                location: location!(),
            });
        };

        Ok(Self { input, predicate })
    }

    /// Filters a [`RecordBatch`] based on the predicate expression.
    ///
    /// Rows where the predicate is null are dropped.
    fn filter_batch(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = self.predicate.eval(batch)?.into_array(batch.num_rows())?;
        let mask = mask.as_boolean_opt().ok_or_else(|| Error::Arrow {
            message: "Failed to downcast predicate to BooleanArray".to_string(),
            location: location!(),
        })?;
        Ok(filter_record_batch(batch, mask)?)
    }
}

impl ExecutionPlan for FilterExec {
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
        let output = self.filter_batch(&input)?;
        trace!(
            predicate = %self.predicate,
            kept = output.num_rows(),
            dropped = input.num_rows() - output.num_rows(),
            "filtered rows"
        );
        Ok(output)
    }

    fn format(&self) -> String {
        format!("FilterExec: [{}]", self.predicate)
    }
}

impl Display for FilterExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}
