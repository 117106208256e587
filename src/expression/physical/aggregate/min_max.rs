use std::{any::Any, cmp::Ordering, fmt::Display, sync::Arc};

use arrow::{
    array::{Array, ArrayRef},
    datatypes::{DataType, Field},
};

use crate::{
    error::Result,
    expression::{physical::expr::PhysicalExpression, values::ScalarValue},
};

use super::{Accumulator, AggregateExpr};

macro_rules! make_min_max_expr {
    ($name:ident, $label:literal, $keep:expr) => {
        #[derive(Debug)]
        pub struct $name {
            /// The input expression used by the accumulator.
            expression: Arc<dyn PhysicalExpression>,
            /// The result datatype.
            data_type: DataType,
            name: String,
        }

        impl $name {
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

        impl AggregateExpr for $name {
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
                Ok(Box::new(MinMaxAccumulator::try_new(&self.data_type, $keep)?))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $label, self.expression)
            }
        }
    };
}

make_min_max_expr!(MinExpr, "MIN", Ordering::Less);
make_min_max_expr!(MaxExpr, "MAX", Ordering::Greater);

/// Keeps the value that orders `keep` relative to every other value seen.
#[derive(Debug)]
pub struct MinMaxAccumulator {
    current: ScalarValue,
    keep: Ordering,
}

impl MinMaxAccumulator {
    /// Creates an accumulator whose result is of `data_type`.
    pub fn try_new(data_type: &DataType, keep: Ordering) -> Result<Self> {
        Ok(Self {
            current: data_type.try_into()?,
            keep,
        })
    }
}

impl Accumulator for MinMaxAccumulator {
    fn eval(&self) -> Result<ScalarValue> {
        Ok(self.current.clone())
    }

    fn update_batch(&mut self, values: &ArrayRef) -> Result<()> {
        for index in 0..values.len() {
            let value = ScalarValue::try_from_array(values.as_ref(), index)?;
            if value.is_null() {
                continue;
            }
            if self.current.is_null() || value.partial_cmp(&self.current) == Some(self.keep) {
                self.current = value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::DataType;

    use crate::{
        expression::{
            physical::{aggregate::AggregateExpr, column::ColumnExpr},
            values::ScalarValue,
        },
        tests::create_record_batch_with_nulls,
    };

    use super::{MaxExpr, MinExpr};

    #[test]
    fn test_min_max_accumulator() {
        let batch = create_record_batch_with_nulls();

        let min = MinExpr::new(Arc::new(ColumnExpr::new("c3", 2)), DataType::Int64, "lo");
        let mut accum = min.create_accumulator().unwrap();
        accum.update_batch(batch.column(2)).unwrap();
        assert_eq!(accum.eval().unwrap(), ScalarValue::Int64(Some(11)));

        let max = MaxExpr::new(Arc::new(ColumnExpr::new("c1", 0)), DataType::Utf8, "hi");
        let mut accum = max.create_accumulator().unwrap();
        assert_eq!(accum.eval().unwrap(), ScalarValue::Utf8(None));
        accum.update_batch(batch.column(0)).unwrap();
        assert_eq!(
            accum.eval().unwrap(),
            ScalarValue::Utf8(Some("world".to_string()))
        );
        assert_eq!(max.to_string(), "MAX(c1@0)");
    }
}
