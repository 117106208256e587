use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray},
    compute::{self, cast},
    datatypes::{DataType, Field, Float64Type},
};

use crate::{
    error::Result,
    expression::{physical::expr::PhysicalExpression, values::ScalarValue},
};

use super::{Accumulator, AggregateExpr};

/// Represents an avg aggregate expression.
#[derive(Debug)]
pub struct AvgExpr {
    /// The input expression used by the accumulator.
    expression: Arc<dyn PhysicalExpression>,
    name: String,
}

impl AvgExpr {
    /// Creates a new [`AvgExpr`] instance.
    pub fn new(expression: Arc<dyn PhysicalExpression>, name: impl Into<String>) -> Self {
        Self {
            expression,
            name: name.into(),
        }
    }
}

impl AggregateExpr for AvgExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn field(&self) -> Result<Field> {
        Ok(Field::new(&self.name, DataType::Float64, true))
    }

    fn expression(&self) -> Arc<dyn PhysicalExpression> {
        self.expression.clone()
    }

    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>> {
        Ok(Box::<AvgAccumulator>::default())
    }
}

impl Display for AvgExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AVG({})", self.expression)
    }
}

/// Keeps a running sum and count; the average of no values is missing.
#[derive(Debug, Default)]
pub struct AvgAccumulator {
    sum: f64,
    count: u64,
}

impl Accumulator for AvgAccumulator {
    fn eval(&self) -> Result<ScalarValue> {
        Ok(match self.count {
            0 => ScalarValue::Float64(None),
            n => ScalarValue::Float64(Some(self.sum / n as f64)),
        })
    }

    fn update_batch(&mut self, values: &ArrayRef) -> Result<()> {
        let values = cast(values, &DataType::Float64)?;
        let values = values.as_primitive::<Float64Type>();
        self.count += (values.len() - values.null_count()) as u64;
        if let Some(delta) = compute::sum(values) {
            self.sum += delta;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        expression::{
            physical::{aggregate::AggregateExpr, column::ColumnExpr},
            values::ScalarValue,
        },
        tests::create_record_batch_with_nulls,
    };

    use super::AvgExpr;

    #[test]
    fn test_avg_accumulator() {
        let expr = AvgExpr::new(Arc::new(ColumnExpr::new("c3", 2)), "avg");
        let batch = create_record_batch_with_nulls();
        let mut accum = expr.create_accumulator().unwrap();

        assert_eq!(accum.eval().unwrap(), ScalarValue::Float64(None));
        accum.update_batch(batch.column(2)).unwrap();
        assert_eq!(accum.eval().unwrap(), ScalarValue::Float64(Some(16.5)));
    }
}
