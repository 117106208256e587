use std::sync::Arc;

use arrow::datatypes::Schema;
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::{
        logical::expr::Expression,
        physical::{
            aggregate::{create_aggregate_expr, AggregateExpr},
            binary::BinaryExpr,
            column::ColumnExpr,
            expr::PhysicalExpression,
            is_null::IsNullExpr,
            literal::LiteralExpr,
            sort::SortExpr,
        },
    },
    plan::{
        logical::plan::LogicalPlan,
        physical::{
            aggregate::AggregateExec, filter::FilterExec, joins::hash_join::HashJoinExec,
            limit::LimitExec, projection::ProjectionExec, scan::ScanExec, sort::SortExec,
        },
    },
};

use super::physical::plan::ExecutionPlan;

/// The query [`Planner`].
///
/// Responsible for translating logical to physical plans.
pub struct Planner;

impl Planner {
    /// Attempts to create a [`ExecutionPlan`] from the provided input [`LogicalPlan`].
    pub fn create_physical_plan(input: &LogicalPlan) -> Result<Arc<dyn ExecutionPlan>> {
        use LogicalPlan::*;

        match input {
            Scan(plan) => Ok(Arc::new(ScanExec::new(plan.name(), plan.source()))),
            Projection(plan) => {
                let physical_input = Self::create_physical_plan(plan.input())?;
                let input_schema = plan.input().schema();
                let expression = plan
                    .expressions()
                    .iter()
                    .map(|expr| Self::create_physical_expression(&input_schema, expr))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(ProjectionExec::new(
                    physical_input,
                    plan.schema(),
                    expression,
                )))
            }
            Filter(plan) => {
                let physical_input = Self::create_physical_plan(plan.input())?;
                let predicate =
                    Self::create_physical_expression(&plan.input().schema(), plan.predicate())?;

                Ok(Arc::new(FilterExec::try_new(physical_input, predicate)?))
            }
            Aggregate(plan) => {
                let physical_input = Self::create_physical_plan(plan.input())?;
                let input_schema = plan.input().schema();

                let group_by = plan
                    .group_by()
                    .iter()
                    .map(|expr| -> Result<_> {
                        Ok((
                            Self::create_physical_expression(&input_schema, expr)?,
                            expr.name(),
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let aggregate_expressions = plan
                    .aggregate_expressions()
                    .iter()
                    .map(|expr| Self::create_aggregate_expression(&input_schema, expr))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(AggregateExec::try_new(
                    physical_input,
                    group_by,
                    aggregate_expressions,
                )?))
            }
            Sort(plan) => {
                let physical_input = Self::create_physical_plan(plan.input())?;
                let input_schema = plan.input().schema();
                let expression = plan
                    .expressions()
                    .iter()
                    .map(|expr| -> Result<SortExpr> {
                        match expr {
                            Expression::Sort(sort) => Ok(SortExpr::new(
                                Self::create_physical_expression(&input_schema, sort.expression())?,
                                sort.ascending(),
                            )),
                            other => Err(Error::InvalidOperation {
                                message: format!("Expected a sort key, found '{}'", other),
                                location: location!(),
                            }),
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(SortExec::new(physical_input, expression)))
            }
            Limit(plan) => {
                let physical_input = Self::create_physical_plan(plan.input())?;
                Ok(Arc::new(LimitExec::new(
                    physical_input,
                    plan.skip(),
                    plan.fetch(),
                )))
            }
            Join(plan) => {
                let lhs = Self::create_physical_plan(plan.lhs())?;
                let rhs = Self::create_physical_plan(plan.rhs())?;
                let left_schema = plan.lhs().schema();
                let right_schema = plan.rhs().schema();
                let on = plan
                    .on()
                    .iter()
                    .map(|(l, r)| -> Result<_> {
                        Ok((
                            ColumnExpr::new(l.name(), l.index_of(&left_schema)?),
                            ColumnExpr::new(r.name(), r.index_of(&right_schema)?),
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Arc::new(HashJoinExec::try_new(
                    lhs,
                    rhs,
                    on,
                    plan.join_type(),
                )?))
            }
        }
    }

    /// Converts a logical to a physical expression.
    ///
    /// Column references resolve to the first field with a matching name.
    pub fn create_physical_expression(
        schema: &Schema,
        expr: &Expression,
    ) -> Result<Arc<dyn PhysicalExpression>> {
        use Expression::*;

        match expr {
            Column(v) => Ok(Arc::new(ColumnExpr::new(v.name(), v.index_of(schema)?))),
            Literal(v) => Ok(Arc::new(LiteralExpr::new(v.clone()))),
            Binary(v) => {
                let left = Self::create_physical_expression(schema, v.lhs())?;
                let right = Self::create_physical_expression(schema, v.rhs())?;
                Ok(Arc::new(BinaryExpr::new(left, *v.op(), right)))
            }
            Alias(v) => Self::create_physical_expression(schema, v.expression()),
            IsNull(v) => Ok(Arc::new(IsNullExpr::new(
                Self::create_physical_expression(schema, v)?,
                false,
            ))),
            IsNotNull(v) => Ok(Arc::new(IsNullExpr::new(
                Self::create_physical_expression(schema, v)?,
                true,
            ))),
            Aggregate(_) | Sort(_) => Err(Error::InvalidOperation {
                message: format!("Cannot evaluate '{}' as a row expression", expr),
                location: location!(),
            }),
        }
    }

    /// Converts a (possibly aliased) aggregate function call.
    fn create_aggregate_expression(
        schema: &Schema,
        expr: &Expression,
    ) -> Result<Arc<dyn AggregateExpr>> {
        match expr.unalias() {
            Expression::Aggregate(aggregate) => {
                let input_type = aggregate.expression().data_type(schema)?;
                let argument = Self::create_physical_expression(schema, aggregate.expression())?;
                create_aggregate_expr(aggregate.func(), argument, &input_type, expr.name())
            }
            other => Err(Error::InvalidOperation {
                message: format!("'{}' is not an aggregate expression", other),
                location: location!(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        expression::logical::expr_fn::{col, count, lit},
        io::memory::MemTable,
        plan::logical::{
            aggregate::Aggregate, filter::Filter, plan::LogicalPlan, scan::Scan, sort::Sort,
        },
        tests::create_record_batch_with_nulls,
    };

    use super::Planner;

    #[test]
    fn test_create_physical_plan() {
        let source = Arc::new(MemTable::new(create_record_batch_with_nulls()));
        let scan = Arc::new(LogicalPlan::Scan(Scan::new("simple", source)));
        let filter = Filter::try_new(scan, col("c2").is_not_null()).unwrap();
        let aggregate = Aggregate::try_new(
            Arc::new(LogicalPlan::Filter(filter)),
            vec![col("c1")],
            vec![count(col("c3")).alias("n")],
        )
        .unwrap();
        let sort = Sort::try_new(
            Arc::new(LogicalPlan::Aggregate(aggregate)),
            vec![col("n").plus(lit(0)).sort(false)],
        )
        .unwrap();
        let plan = LogicalPlan::Sort(sort);

        let exec = Planner::create_physical_plan(&plan).unwrap();
        assert_eq!(
            exec.to_string(),
            "SortExec: [n@1 + 0 DESC]\n\t\
                AggregateExec: groupExprs:[c1@0], aggrExprs:[COUNT(c3@2)]\n\t\t\
                    FilterExec: [c2@1 IS NOT NULL]\n\t\t\t\
                        ScanExec: simple\n"
        );

        let batch = exec.execute().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema(), plan.schema());
    }
}
