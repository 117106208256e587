use std::{fmt::Display, sync::Arc};

use arrow::datatypes::SchemaRef;
use itertools::Itertools;
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::logical::expr::Expression,
};

use super::plan::LogicalPlan;

/// Represents a sort operation in a logical plan.
#[derive(Debug, Clone)]
pub struct Sort {
    /// The input [`LogicalPlan`].
    input: Arc<LogicalPlan>,
    /// The sort expressions.
    expression: Vec<Expression>,
}

impl Sort {
    /// Attempts to create a new [`Sort`] instance.
    ///
    /// Plain expressions are treated as ascending sort keys.
    pub fn try_new(input: Arc<LogicalPlan>, expression: Vec<Expression>) -> Result<Self> {
        if expression.is_empty() {
            return Err(Error::InvalidOperation {
                message: "Cannot sort without sort keys".to_string(),
                location: location!(),
            });
        }

        let schema = input.schema();
        let expression = expression
            .into_iter()
            .map(|expr| -> Result<Expression> {
                expr.ensure_no_aggregate("a sort key")?;
                expr.data_type(&schema)?;
                Ok(match expr {
                    Expression::Sort(_) => expr,
                    other => other.sort(true),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { input, expression })
    }

    /// Retrieves the input [`LogicalPlan`].
    pub fn input(&self) -> &LogicalPlan {
        self.input.as_ref()
    }

    /// Retrieves the sort expression.
    pub fn expressions(&self) -> &[Expression] {
        self.expression.as_slice()
    }

    /// A reference-counted [`arrow::datatypes::Schema`] of the input plan.
    pub fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    /// Retrieves the child logical plans.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sort: [{}]", self.expression.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        error::Error,
        expression::logical::expr_fn::col,
        io::memory::MemTable,
        plan::logical::{plan::LogicalPlan, scan::Scan},
        tests::create_record_batch,
    };

    use super::Sort;

    #[test]
    fn test_sort_defaults_to_ascending() {
        let source = Arc::new(MemTable::new(create_record_batch()));
        let scan = Arc::new(LogicalPlan::Scan(Scan::new("simple", source)));

        let sort = Sort::try_new(scan.clone(), vec![col("c2"), col("c3").sort(false)]).unwrap();
        assert_eq!(sort.to_string(), "Sort: [c2 ASC NULLS FIRST, c3 DESC NULLS LAST]");

        let result = Sort::try_new(scan, vec![col("missing")]);
        assert!(matches!(result, Err(Error::Reference { .. })));
    }
}
