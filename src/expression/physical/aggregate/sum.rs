use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{ArrayRef, ArrowNativeTypeOp, AsArray},
    compute::{self, cast},
    datatypes::{DataType, Field, Float64Type, Int64Type},
};
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::{physical::expr::PhysicalExpression, values::ScalarValue},
};

use super::{Accumulator, AggregateExpr};

/// Represents a sum aggregate expression.
#[derive(Debug)]
pub struct SumExpr {
    expression: Arc<dyn PhysicalExpression>,
    /// `Int64` for integer input, `Float64` otherwise.
    data_type: DataType,
    name: String,
}

impl SumExpr {
    /// Creates a new [`SumExpr`] instance.
    pub fn new(
        expression: Arc<dyn PhysicalExpression>,
        data_type: DataType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            expression,
            data_type,
            name: name.into(),
        }
    }
}

impl AggregateExpr for SumExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn field(&self) -> Result<Field> {
        Ok(Field::new(&self.name, self.data_type.clone(), true))
    }

    fn expression(&self) -> Arc<dyn PhysicalExpression> {
        self.expression.clone()
    }

    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>> {
        match self.data_type {
            DataType::Int64 => Ok(Box::<IntegerSumAccumulator>::default()),
            DataType::Float64 => Ok(Box::<FloatSumAccumulator>::default()),
            _ => Err(Error::InvalidOperation {
                message: format!("Sum not supported for datatype {}", self.data_type),
                location: location!(),
            }),
        }
    }
}

impl Display for SumExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SUM({})", self.expression)
    }
}

/// Sums integers, failing on overflow.
#[derive(Debug, Default)]
pub struct IntegerSumAccumulator {
    sum: Option<i64>,
}

impl Accumulator for IntegerSumAccumulator {
    fn eval(&self) -> Result<ScalarValue> {
        Ok(ScalarValue::Int64(self.sum))
    }

    fn update_batch(&mut self, values: &ArrayRef) -> Result<()> {
        let values = cast(values, &DataType::Int64)?;
        if let Some(delta) = compute::sum(values.as_primitive::<Int64Type>()) {
            let s = self.sum.get_or_insert(0);
            *s = s.add_checked(delta)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FloatSumAccumulator {
    sum: Option<f64>,
}

impl Accumulator for FloatSumAccumulator {
    fn eval(&self) -> Result<ScalarValue> {
        Ok(ScalarValue::Float64(self.sum))
    }

    fn update_batch(&mut self, values: &ArrayRef) -> Result<()> {
        let values = cast(values, &DataType::Float64)?;
        if let Some(delta) = compute::sum(values.as_primitive::<Float64Type>()) {
            *self.sum.get_or_insert(0.0) += delta;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{ArrayRef, Int64Array},
        datatypes::DataType,
    };

    use crate::{
        error::Error,
        expression::{
            physical::{aggregate::AggregateExpr, column::ColumnExpr},
            values::ScalarValue,
        },
        tests::{create_record_batch, create_record_batch_with_nulls},
    };

    use super::SumExpr;

    #[test]
    fn test_sum_accumulator() {
        let expr = SumExpr::new(Arc::new(ColumnExpr::new("c2", 1)), DataType::Int64, "s");
        let batch = create_record_batch();
        let mut accum = expr.create_accumulator().unwrap();

        assert_eq!(accum.eval().unwrap(), ScalarValue::Int64(None));
        accum.update_batch(batch.column(1)).unwrap();
        accum.update_batch(create_record_batch_with_nulls().column(1)).unwrap();

        assert_eq!(accum.eval().unwrap(), ScalarValue::Int64(Some(6)));
    }

    #[test]
    fn test_sum_accumulator_float() {
        let expr = SumExpr::new(Arc::new(ColumnExpr::new("c2", 1)), DataType::Float64, "s");
        let batch = create_record_batch();
        let mut accum = expr.create_accumulator().unwrap();

        accum.update_batch(batch.column(1)).unwrap();
        assert_eq!(accum.eval().unwrap(), ScalarValue::Float64(Some(3.0)));
    }

    #[test]
    fn test_sum_accumulator_overflow() {
        let expr = SumExpr::new(Arc::new(ColumnExpr::new("c2", 1)), DataType::Int64, "s");
        let mut accum = expr.create_accumulator().unwrap();
        let values: ArrayRef = Arc::new(Int64Array::from(vec![i64::MAX]));

        accum.update_batch(&values).unwrap();
        let result = accum.update_batch(&values);
        assert!(matches!(result, Err(Error::Arrow { .. })));
    }
}
