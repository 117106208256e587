use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{ArrayRef, RecordBatch, UInt32Array},
    compute::take,
    datatypes::{Field, Schema, SchemaRef},
};
use itertools::Itertools;
use tracing::debug;

use crate::{
    error::Result,
    expression::{
        physical::{
            aggregate::{Accumulator, AggregateExpr},
            expr::PhysicalExpression,
        },
        values::ScalarValue,
    },
};

use super::plan::{format_exec, ExecutionPlan};

pub mod group_values;

use group_values::GroupValues;

/// Represents an aggregate physical plan.
///
/// Without grouping expressions the output is exactly one row.
/// Otherwise there is one row per distinct key, in order of first appearance.
#[derive(Debug)]
pub struct AggregateExec {
    /// The input physical plan.
    input: Arc<dyn ExecutionPlan>,
    /// Group by expressions including alias.
    group_by: Vec<(Arc<dyn PhysicalExpression>, String)>,
    /// Aggregate expressions.
    aggregate_expressions: Vec<Arc<dyn AggregateExpr>>,
    /// The schema after the aggregate is applied.
    schema: SchemaRef,
}

impl AggregateExec {
    /// Creates a new [`AggregateExec`] instance.
    pub fn try_new(
        input: Arc<dyn ExecutionPlan>,
        group_by: Vec<(Arc<dyn PhysicalExpression>, String)>,
        aggregate_expressions: Vec<Arc<dyn AggregateExpr>>,
    ) -> Result<Self> {
        let schema = Self::create_schema(input.as_ref(), &group_by, &aggregate_expressions)?;

        Ok(Self {
            input,
            group_by,
            aggregate_expressions,
            schema,
        })
    }

    /// Creates a new schema by combining the fields from
    /// the group by and aggregate expressions.
    fn create_schema(
        input: &dyn ExecutionPlan,
        group_by: &[(Arc<dyn PhysicalExpression>, String)],
        aggregate_expressions: &[Arc<dyn AggregateExpr>],
    ) -> Result<SchemaRef> {
        let input_schema = input.schema();
        let mut fields = Vec::with_capacity(group_by.len() + aggregate_expressions.len());
        for (expr, name) in group_by {
            fields.push(Field::new(name, expr.data_type(&input_schema)?, true));
        }
        for expr in aggregate_expressions {
            fields.push(expr.field()?);
        }

        Ok(Arc::new(Schema::new(fields)))
    }

    fn create_accumulators(&self) -> Result<Vec<Box<dyn Accumulator>>> {
        self.aggregate_expressions
            .iter()
            .map(|expr| expr.create_accumulator())
            .collect()
    }

    /// Evaluates the input of every aggregate expression.
    fn aggregate_inputs(&self, batch: &RecordBatch) -> Result<Vec<ArrayRef>> {
        self.aggregate_expressions
            .iter()
            .map(|expr| expr.expression().eval(batch)?.into_array(batch.num_rows()))
            .collect()
    }

    /// Builds one output column per aggregate from the per-group results.
    fn finish_accumulators(&self, results: Vec<Vec<ScalarValue>>) -> Result<Vec<ArrayRef>> {
        let offset = self.group_by.len();
        results
            .into_iter()
            .enumerate()
            .map(|(idx, scalars)| {
                ScalarValue::iter_to_array(scalars, self.schema.field(offset + idx).data_type())
            })
            .collect()
    }

    fn aggregate_without_groups(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let inputs = self.aggregate_inputs(batch)?;
        let mut results = Vec::with_capacity(inputs.len());
        for (mut accumulator, values) in self.create_accumulators()?.into_iter().zip(inputs) {
            accumulator.update_batch(&values)?;
            results.push(vec![accumulator.eval()?]);
        }

        let columns = self.finish_accumulators(results)?;
        Ok(RecordBatch::try_new(self.schema.clone(), columns)?)
    }

    fn aggregate_with_groups(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let keys = self
            .group_by
            .iter()
            .map(|(expr, _)| expr.eval(batch)?.into_array(batch.num_rows()))
            .collect::<Result<Vec<_>>>()?;
        let key_types = keys
            .iter()
            .map(|key| key.data_type().clone())
            .collect::<Vec<_>>();

        let mut group_values = GroupValues::try_new(&key_types)?;
        let mut groups = vec![];
        group_values.intern(&keys, &mut groups)?;

        let mut rows_per_group = vec![Vec::<u32>::new(); group_values.len()];
        for (row_idx, group_idx) in groups.iter().enumerate() {
            rows_per_group[*group_idx].push(row_idx as u32);
        }
        debug!(
            rows = batch.num_rows(),
            groups = group_values.len(),
            "grouped rows"
        );

        let inputs = self.aggregate_inputs(batch)?;
        let mut results = vec![Vec::with_capacity(group_values.len()); inputs.len()];
        for rows in rows_per_group {
            let rows = UInt32Array::from(rows);
            for (idx, accumulator) in self.create_accumulators()?.iter_mut().enumerate() {
                accumulator.update_batch(&take(inputs[idx].as_ref(), &rows, None)?)?;
                results[idx].push(accumulator.eval()?);
            }
        }

        let first_rows = UInt32Array::from(
            group_values
                .first_rows()
                .iter()
                .map(|row| *row as u32)
                .collect::<Vec<_>>(),
        );
        let mut columns = keys
            .iter()
            .map(|key| take(key.as_ref(), &first_rows, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        columns.extend(self.finish_accumulators(results)?);

        Ok(RecordBatch::try_new(self.schema.clone(), columns)?)
    }
}

impl ExecutionPlan for AggregateExec {
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

        if self.group_by.is_empty() {
            self.aggregate_without_groups(&input)
        } else {
            self.aggregate_with_groups(&input)
        }
    }

    fn format(&self) -> String {
        format!(
            "AggregateExec: groupExprs:[{}], aggrExprs:[{}]",
            self.group_by.iter().map(|(expr, _)| expr).join(", "),
            self.aggregate_expressions.iter().join(", ")
        )
    }
}

impl Display for AggregateExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Array, Int64Array, RecordBatch, StringArray},
        datatypes::{DataType, Field, Schema},
        util::pretty::pretty_format_batches,
    };

    use crate::{
        expression::{
            logical::aggregate::AggregateFunction,
            physical::{
                aggregate::{create_aggregate_expr, AggregateExpr},
                column::ColumnExpr,
                expr::PhysicalExpression,
            },
        },
        io::memory::MemTable,
        plan::physical::{limit::LimitExec, plan::ExecutionPlan, scan::ScanExec},
    };

    use super::AggregateExec;

    fn input() -> Arc<dyn ExecutionPlan> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("country", DataType::Utf8, true),
            Field::new("length", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["TR", "DK", "TR", "DK", "TR"])),
                Arc::new(Int64Array::from(vec![Some(10), Some(4), None, Some(6), Some(2)])),
            ],
        )
        .unwrap();
        Arc::new(ScanExec::new("lines", Arc::new(MemTable::new(batch))))
    }

    fn aggregate(func: AggregateFunction, name: &str) -> Arc<dyn AggregateExpr> {
        let length: Arc<dyn PhysicalExpression> = Arc::new(ColumnExpr::new("length", 1));
        create_aggregate_expr(&func, length, &DataType::Int64, name).unwrap()
    }

    #[test]
    fn test_grouped_aggregate() {
        let country: Arc<dyn PhysicalExpression> = Arc::new(ColumnExpr::new("country", 0));
        let exec = AggregateExec::try_new(
            input(),
            vec![(country, "country".to_string())],
            vec![
                aggregate(AggregateFunction::Count, "n"),
                aggregate(AggregateFunction::Sum, "total"),
                aggregate(AggregateFunction::Max, "longest"),
            ],
        )
        .unwrap();

        let result = exec.execute().unwrap();
        let expected = vec![
            "+---------+---+-------+---------+",
            "| country | n | total | longest |",
            "+---------+---+-------+---------+",
            "| TR      | 2 | 12    | 10      |",
            "| DK      | 2 | 10    | 6       |",
            "+---------+---+-------+---------+",
        ];
        assert_eq!(
            pretty_format_batches(&[result]).unwrap().to_string(),
            expected.join("\n")
        );
    }

    #[test]
    fn test_global_aggregate_on_empty_input() {
        let exec = AggregateExec::try_new(
            Arc::new(LimitExec::new(input(), 0, Some(0))),
            vec![],
            vec![
                aggregate(AggregateFunction::Count, "n"),
                aggregate(AggregateFunction::Avg, "mean"),
            ],
        )
        .unwrap();

        let result = exec.execute().unwrap();
        assert_eq!(result.num_rows(), 1);
        assert_eq!(result.schema().field(1).data_type(), &DataType::Float64);
        assert!(result.column(1).is_null(0));
    }
}
