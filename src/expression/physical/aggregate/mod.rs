use std::{
    any::Any,
    fmt::{Debug, Display},
    sync::Arc,
};

use arrow::{
    array::ArrayRef,
    datatypes::{DataType, Field},
};

use crate::{
    error::Result,
    expression::{logical::aggregate::AggregateFunction, values::ScalarValue},
};

use super::expr::PhysicalExpression;

pub mod average;
pub mod count;
pub mod min_max;
pub mod sum;

use average::AvgExpr;
use count::CountExpr;
use min_max::{MaxExpr, MinExpr};
use sum::SumExpr;

/// Tracks an aggregate function's state.
pub trait Accumulator: Debug {
    /// Returns the final aggregate value.
    fn eval(&self) -> Result<ScalarValue>;

    /// Updates the accumulator's state from its input.
    fn update_batch(&mut self, values: &ArrayRef) -> Result<()>;
}

/// A trait that represents an [`AggregateExpr`].
pub trait AggregateExpr: Debug + Display {
    /// Returns the aggregate expression as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// The field of the final result of this aggregation.
    fn field(&self) -> Result<Field>;

    /// The accumulator used to accumulate values from the expression.
    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>>;

    /// The expression that feeds the accumulator.
    fn expression(&self) -> Arc<dyn PhysicalExpression>;
}

/// Creates the physical aggregate for `func` over `expression`,
/// whose values are of `input_type`. The result column is called `name`.
pub fn create_aggregate_expr(
    func: &AggregateFunction,
    expression: Arc<dyn PhysicalExpression>,
    input_type: &DataType,
    name: impl Into<String>,
) -> Result<Arc<dyn AggregateExpr>> {
    let output_type = func.result_type(input_type)?;
    let name = name.into();

    let expr: Arc<dyn AggregateExpr> = match func {
        AggregateFunction::Count => Arc::new(CountExpr::new(expression, name)),
        AggregateFunction::Sum => Arc::new(SumExpr::new(expression, output_type, name)),
        AggregateFunction::Avg => Arc::new(AvgExpr::new(expression, name)),
        AggregateFunction::Min => Arc::new(MinExpr::new(expression, output_type, name)),
        AggregateFunction::Max => Arc::new(MaxExpr::new(expression, output_type, name)),
    };

    Ok(expr)
}
