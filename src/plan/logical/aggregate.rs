use std::{fmt::Display, sync::Arc};

use arrow::datatypes::{Schema, SchemaRef};
use itertools::Itertools;
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::logical::expr::Expression,
};

use super::plan::LogicalPlan;

/// Represents an [`Aggregate`] logical plan in a query.
///
/// The output schema lists the grouping columns first,
/// followed by one column per aggregate expression.
#[derive(Debug, Clone)]
pub struct Aggregate {
    /// The input logical plan.
    input: Arc<LogicalPlan>,
    /// A reference-counted [`arrow::datatypes::Schema`].
    schema: SchemaRef,
    /// The expressions used for grouping the data.
    group_by: Vec<Expression>,
    /// The expressions used for aggregation.
    aggregate_expressions: Vec<Expression>,
}

impl Aggregate {
    /// Creates a new [`Aggregate`] instance.
    ///
    /// Every aggregate expression must be an aggregate function call,
    /// optionally wrapped in an alias, whose argument holds no aggregate.
    pub fn try_new(
        input: Arc<LogicalPlan>,
        group_by: Vec<Expression>,
        aggregate_expressions: Vec<Expression>,
    ) -> Result<Self> {
        for expr in group_by.iter() {
            expr.ensure_no_aggregate("a grouping expression")?;
        }
        for expr in aggregate_expressions.iter() {
            match expr.unalias() {
                Expression::Aggregate(aggregate) => aggregate
                    .expression()
                    .ensure_no_aggregate("an aggregate argument")?,
                other => {
                    return Err(Error::InvalidOperation {
                        message: format!("'{}' is not an aggregate expression", other),
                        location: location!(),
                    })
                }
            }
        }

        let input_schema = input.schema();
        let fields = group_by
            .iter()
            .chain(aggregate_expressions.iter())
            .map(|expr| expr.to_field(&input_schema))
            .collect::<Result<Vec<_>>>()?;
        let schema = Arc::new(Schema::new(fields));

        Ok(Self {
            input,
            schema,
            group_by,
            aggregate_expressions,
        })
    }

    /// The input logical plan.
    pub fn input(&self) -> &LogicalPlan {
        self.input.as_ref()
    }

    /// A reference-counted [`arrow::datatypes::Schema`].
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Returns the children of this logical plan.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }

    /// Returns a slice of expressions used for grouping the data.
    pub fn group_by(&self) -> &[Expression] {
        self.group_by.as_slice()
    }

    /// Returns a slice of expressions used for aggregation.
    pub fn aggregate_expressions(&self) -> &[Expression] {
        self.aggregate_expressions.as_slice()
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Aggregate: groupBy:[{}]; aggrExprs:[{}]",
            self.group_by.iter().join(", "),
            self.aggregate_expressions.iter().join(", ")
        )
    }
}
