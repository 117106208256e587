use std::{fmt::Display, sync::Arc};

use arrow::datatypes::{Schema, SchemaRef};
use itertools::Itertools;
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::logical::expr::Expression,
};

use super::plan::LogicalPlan;

/// Represents a projection operation in a logical plan.
#[derive(Debug, Clone)]
pub struct Projection {
    /// The input [`LogicalPlan`].
    input: Arc<LogicalPlan>,
    /// A list of expressions to apply.
    expressions: Vec<Expression>,
    /// The output schema.
    schema: SchemaRef,
}

impl Projection {
    /// Attempts to create a new [`Projection`] instance.
    ///
    /// Aggregates and sort keys cannot be projected.
    pub fn try_new(input: Arc<LogicalPlan>, expressions: Vec<Expression>) -> Result<Self> {
        if expressions.is_empty() {
            return Err(Error::InvalidOperation {
                message: "Cannot create a projection without expressions".to_string(),
                location: location!(),
            });
        }

        let input_schema = input.schema();
        let fields = expressions
            .iter()
            .map(|expr| {
                expr.ensure_no_aggregate("a projection")?;
                if let Expression::Sort(_) = expr.unalias() {
                    return Err(Error::InvalidOperation {
                        message: format!("Sort expression '{expr}' cannot be projected"),
                        location: location!(),
                    });
                }
                expr.to_field(&input_schema)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            input,
            expressions,
            schema: Arc::new(Schema::new(fields)),
        })
    }

    /// Retrieves the input [`LogicalPlan`].
    pub fn input(&self) -> &LogicalPlan {
        &self.input
    }

    /// A reference-counted [`arrow::datatypes::Schema`].
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Retrieves the child logical plans.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }

    /// Retrieves the projected expressions.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Projection: [{}]", self.expressions.iter().join(", "))
    }
}
