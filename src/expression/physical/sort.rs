use std::{fmt::Display, sync::Arc};

use arrow::{
    array::RecordBatch,
    compute::{SortColumn, SortOptions},
};

use super::expr::PhysicalExpression;

use crate::error::Result;

/// Represents a physical sort key in a query.
#[derive(Debug, Clone)]
pub struct SortExpr {
    /// The sort expression to be evaluated.
    expression: Arc<dyn PhysicalExpression>,
    /// Indicates whether the sort order is ascending or not.
    ascending: bool,
}

impl SortExpr {
    /// Creates a new [`SortExpr`] instance.
    pub fn new(expression: Arc<dyn PhysicalExpression>, ascending: bool) -> Self {
        Self {
            expression,
            ascending,
        }
    }

    /// Retrieves the sort expression to be evaluated.
    pub fn expression(&self) -> &dyn PhysicalExpression {
        self.expression.as_ref()
    }

    /// Retrieves the sort order.
    pub fn ascending(&self) -> bool {
        self.ascending
    }

    /// Missing values sort first ascending and last descending.
    pub fn options(&self) -> SortOptions {
        SortOptions {
            descending: !self.ascending,
            nulls_first: self.ascending,
        }
    }

    /// Evaluates the key against `input`.
    pub fn evaluate_to_sort_column(&self, input: &RecordBatch) -> Result<SortColumn> {
        let values = self.expression.eval(input)?.into_array(input.num_rows())?;

        Ok(SortColumn {
            values,
            options: Some(self.options()),
        })
    }
}

impl Display for SortExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order_str = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {}", self.expression, order_str)
    }
}
