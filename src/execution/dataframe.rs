use std::sync::Arc;

use arrow::{array::RecordBatch, datatypes::SchemaRef, util::pretty};
use snafu::location;
use tracing::debug;

use crate::{
    error::{Error, Result},
    expression::logical::{column::Column, expr::Expression},
    plan::{
        logical::{
            aggregate::Aggregate,
            filter::Filter,
            join::{Join, JoinType},
            limit::Limit,
            plan::LogicalPlan,
            projection::Projection,
            sort::Sort,
        },
        planner::Planner,
    },
};

/// Represents a [`DataFrame`] for query execution and data manipulation.
///
/// Every builder method validates the new step against the current schema
/// and fails early on unknown columns or mismatched types.
#[derive(Debug, Clone)]
pub struct DataFrame {
    /// The [`LogicalPlan`] for the [`DataFrame`].
    plan: LogicalPlan,
}

impl DataFrame {
    /// Creates a new [`DataFrame`] instance.
    pub fn new(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    /// The [`LogicalPlan`] built so far.
    pub fn logical_plan(&self) -> &LogicalPlan {
        &self.plan
    }

    /// Consumes the [`DataFrame`], returning its [`LogicalPlan`].
    pub fn into_logical_plan(self) -> LogicalPlan {
        self.plan
    }

    /// The output schema of the [`DataFrame`].
    pub fn schema(&self) -> SchemaRef {
        self.plan.schema()
    }

    /// Renders the builder calls that produce this [`DataFrame`].
    pub fn to_pipeline(&self) -> String {
        self.plan.to_pipeline()
    }

    /// Displays the dataframe's content in a tabular format.
    pub fn show(&self) -> Result<()> {
        let results = self.collect()?;
        Ok(pretty::print_batches(&[results])?)
    }

    /// Executes the plan and collects the result as a single `RecordBatch`.
    pub fn collect(&self) -> Result<RecordBatch> {
        let physical_plan = Planner::create_physical_plan(&self.plan)?;
        debug!(plan = %physical_plan, "executing physical plan");
        let batch = physical_plan.execute()?;
        debug!(rows = batch.num_rows(), "collected dataframe");

        Ok(batch)
    }

    /// Projects the selected columns on the [`DataFrame`].
    pub fn select(self, columns: Vec<Expression>) -> Result<Self> {
        let plan = LogicalPlan::Projection(Projection::try_new(Arc::new(self.plan), columns)?);
        Ok(Self { plan })
    }

    /// Applies a filter predicate on the [`DataFrame`].
    pub fn filter(self, predicate: Expression) -> Result<Self> {
        let plan = LogicalPlan::Filter(Filter::try_new(Arc::new(self.plan), predicate)?);
        Ok(Self { plan })
    }

    /// Performs an aggregation operation based on the
    /// provided grouping and aggregation expressions.
    pub fn aggregate(
        self,
        group_by: Vec<Expression>,
        aggregate_expressions: Vec<Expression>,
    ) -> Result<Self> {
        let plan = LogicalPlan::Aggregate(Aggregate::try_new(
            Arc::new(self.plan),
            group_by,
            aggregate_expressions,
        )?);
        Ok(Self { plan })
    }

    /// Performs an order_by or sort operation based on
    /// the provided sort expression.
    pub fn order_by(self, expression: Vec<Expression>) -> Result<Self> {
        let plan = LogicalPlan::Sort(Sort::try_new(Arc::new(self.plan), expression)?);
        Ok(Self { plan })
    }

    /// Performs a limit operation, skipping rows, and fetching some number of rows.
    pub fn limit(self, skip: usize, fetch: Option<usize>) -> Self {
        let plan = LogicalPlan::Limit(Limit::new(Arc::new(self.plan), skip, fetch));
        Self { plan }
    }

    /// Joins `rhs` on pairwise equality of the named key columns.
    pub fn join(
        self,
        rhs: DataFrame,
        join_type: JoinType,
        on_left: &[&str],
        on_right: &[&str],
    ) -> Result<Self> {
        if on_left.len() != on_right.len() {
            return Err(Error::InvalidOperation {
                message: format!(
                    "Join needs the same number of left and right keys, got {} and {}",
                    on_left.len(),
                    on_right.len()
                ),
                location: location!(),
            });
        }

        let on = on_left
            .iter()
            .zip(on_right.iter())
            .map(|(l, r)| (Column::new(*l), Column::new(*r)))
            .collect::<Vec<_>>();
        let plan = LogicalPlan::Join(Join::try_new(
            Arc::new(self.plan),
            Arc::new(rhs.plan),
            on,
            join_type,
        )?);

        Ok(Self { plan })
    }
}
