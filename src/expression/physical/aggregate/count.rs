use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{Array, ArrayRef},
    datatypes::{DataType, Field},
};

use crate::{
    error::Result,
    expression::{physical::expr::PhysicalExpression, values::ScalarValue},
};

use super::{Accumulator, AggregateExpr};

/// Represents a count aggregate expression.
#[derive(Debug)]
pub struct CountExpr {
    /// The input expression used by the accumulator.
    expression: Arc<dyn PhysicalExpression>,
    /// The output column name.
    name: String,
}

impl CountExpr {
    /// Creates a new [`CountExpr`] instance.
    pub fn new(expression: Arc<dyn PhysicalExpression>, name: impl Into<String>) -> Self {
        Self {
            expression,
            name: name.into(),
        }
    }
}

impl AggregateExpr for CountExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn field(&self) -> Result<Field> {
        Ok(Field::new(&self.name, DataType::Int64, true))
    }

    fn expression(&self) -> Arc<dyn PhysicalExpression> {
        self.expression.clone()
    }

    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>> {
        Ok(Box::new(CountAccumulator::new()))
    }
}

impl Display for CountExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "COUNT({})", self.expression)
    }
}

/// Represents the accumulator for the count expression.
#[derive(Debug, Default)]
pub struct CountAccumulator {
    /// The current count of non-null values.
    count: i64,
}

impl CountAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for CountAccumulator {
    fn eval(&self) -> Result<ScalarValue> {
        Ok(ScalarValue::Int64(Some(self.count)))
    }

    fn update_batch(&mut self, values: &ArrayRef) -> Result<()> {
        let null_count = values.logical_nulls().map_or(0, |x| x.null_count());
        self.count += (values.len() - null_count) as i64;
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

    use super::CountExpr;

    #[test]
    fn test_count_accumulator() {
        let expr = CountExpr::new(Arc::new(ColumnExpr::new("c1", 0)), "COUNT(c1)");
        let batch = create_record_batch_with_nulls();
        let mut accum = expr.create_accumulator().unwrap();

        assert_eq!(accum.eval().unwrap(), ScalarValue::Int64(Some(0)));
        accum.update_batch(batch.column(0)).unwrap();
        let result = accum.eval().unwrap();
        let expected = ScalarValue::Int64(Some(2));

        assert_eq!(result, expected);
        assert_eq!(expr.field().unwrap().name(), "COUNT(c1)");
    }
}
