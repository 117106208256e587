use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::RecordBatch,
    compute::{is_not_null, is_null},
    datatypes::{DataType, Schema},
};

use crate::{error::Result, expression::values::ColumnarValue};

use super::expr::PhysicalExpression;

/// Tests whether the values of an expression are missing.
#[derive(Debug)]
pub struct IsNullExpr {
    expression: Arc<dyn PhysicalExpression>,
    /// `IS NOT NULL` instead of `IS NULL`.
    negated: bool,
}

impl IsNullExpr {
    /// Creates a new [`IsNullExpr`] instance.
    pub fn new(expression: Arc<dyn PhysicalExpression>, negated: bool) -> Self {
        Self {
            expression,
            negated,
        }
    }
}

impl PhysicalExpression for IsNullExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn data_type(&self, _schema: &Schema) -> Result<DataType> {
        Ok(DataType::Boolean)
    }

    fn eval(&self, input: &RecordBatch) -> Result<ColumnarValue> {
        let values = self.expression.eval(input)?.into_array(input.num_rows())?;
        let result = match self.negated {
            true => is_not_null(&values)?,
            false => is_null(&values)?,
        };

        Ok(ColumnarValue::Array(Arc::new(result)))
    }
}

impl Display for IsNullExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.negated {
            true => write!(f, "{} IS NOT NULL", self.expression),
            false => write!(f, "{} IS NULL", self.expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, BooleanArray};

    use crate::{
        expression::physical::{column::ColumnExpr, expr::PhysicalExpression},
        tests::create_record_batch_with_nulls,
    };

    use super::IsNullExpr;

    #[test]
    fn test_is_null_expr_eval() {
        let batch = create_record_batch_with_nulls();
        let column = Arc::new(ColumnExpr::new("c1", 0));

        let result = IsNullExpr::new(column.clone(), false)
            .eval(&batch)
            .unwrap()
            .into_array(3)
            .unwrap();
        assert_eq!(
            result.as_boolean(),
            &BooleanArray::from(vec![false, true, false])
        );

        let negated = IsNullExpr::new(column, true);
        let result = negated.eval(&batch).unwrap().into_array(3).unwrap();
        assert_eq!(
            result.as_boolean(),
            &BooleanArray::from(vec![true, false, true])
        );
        assert_eq!(negated.to_string(), "c1@0 IS NOT NULL");
    }
}
