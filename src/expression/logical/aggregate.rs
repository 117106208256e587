use std::{fmt::Display, sync::Arc};

use crate::error::{Error, Result};
use arrow::datatypes::DataType;
use snafu::location;

use super::expr::Expression;

/// Represents aggregate functions
/// that can be applied with [`Aggregate`] expressions.
///
/// All of them skip missing input values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// The count function (e.g. `SELECT COUNT(a) FROM t;`)
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Returns the name of the aggregate function as a string.
    pub fn name(&self) -> &str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// The name of the builder function creating this aggregate.
    pub fn method_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Returns the result data type of the aggregate function
    /// applied to values of `input`.
    pub fn result_type(&self, input: &DataType) -> Result<DataType> {
        use DataType::*;

        let unsupported = || Error::InvalidData {
            message: format!("{}({}) is not a valid aggregate", self.name(), input),
            location: location!(),
        };

        match self {
            AggregateFunction::Count => Ok(Int64),
            AggregateFunction::Sum => match input {
                Int32 | Int64 | Null => Ok(Int64),
                Float32 | Float64 => Ok(Float64),
                _ => Err(unsupported()),
            },
            AggregateFunction::Avg => match input {
                Int32 | Int64 | Float32 | Float64 | Null => Ok(Float64),
                _ => Err(unsupported()),
            },
            AggregateFunction::Min | AggregateFunction::Max => match input {
                Int32 | Int64 => Ok(Int64),
                Float32 | Float64 => Ok(Float64),
                Utf8 | Boolean => Ok(input.clone()),
                _ => Err(unsupported()),
            },
        }
    }
}

impl TryFrom<&str> for AggregateFunction {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Ok(AggregateFunction::Count),
            "SUM" => Ok(AggregateFunction::Sum),
            "AVG" => Ok(AggregateFunction::Avg),
            "MIN" => Ok(AggregateFunction::Min),
            "MAX" => Ok(AggregateFunction::Max),
            _ => Err(Error::Unsupported {
                construct: format!("function '{name}'"),
                location: location!(),
            }),
        }
    }
}

/// Represents an [`Aggregate`] expression
/// combining an [`AggregateFunction`] and an [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    /// The aggregate function to be applied.
    func: AggregateFunction,
    /// The expression to aggregate.
    expression: Arc<Expression>,
}

impl Aggregate {
    /// Creates a new [`Aggregate`] instance.
    pub fn new(func: AggregateFunction, expression: Arc<Expression>) -> Self {
        Self { func, expression }
    }

    /// Returns the name of the aggregate function.
    pub fn name(&self) -> &str {
        self.func.name()
    }

    /// The aggregate function to be applied.
    pub fn func(&self) -> &AggregateFunction {
        &self.func
    }

    /// The expression to aggregate.
    pub fn expression(&self) -> &Expression {
        self.expression.as_ref()
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.expression)
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::DataType;

    use crate::error::Error;

    use super::AggregateFunction;

    #[test]
    fn test_aggregate_function_from_name() {
        assert_eq!(
            AggregateFunction::try_from("count").unwrap(),
            AggregateFunction::Count
        );
        assert_eq!(AggregateFunction::try_from("Avg").unwrap(), AggregateFunction::Avg);

        let result = AggregateFunction::try_from("row_number");
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_aggregate_function_result_type() {
        let sum = AggregateFunction::Sum;
        assert_eq!(sum.result_type(&DataType::Int64).unwrap(), DataType::Int64);
        assert_eq!(sum.result_type(&DataType::Float64).unwrap(), DataType::Float64);
        assert!(sum.result_type(&DataType::Utf8).is_err());

        let count = AggregateFunction::Count;
        assert_eq!(count.result_type(&DataType::Utf8).unwrap(), DataType::Int64);
    }
}
