use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{new_null_array, ArrayRef, AsArray, RecordBatch},
    compute::{
        and_kleene, cast,
        kernels::{
            cmp,
            numeric::{add_wrapping, div, mul_wrapping, sub_wrapping},
        },
        or_kleene,
    },
    datatypes::{DataType, Schema},
};

use crate::{
    error::Result,
    expression::{coercion::Signature, operator::Operator, values::ColumnarValue},
};

use super::expr::PhysicalExpression;

/// Two physical expressions combined by an [`Operator`].
///
/// Both inputs are cast to the coerced input types before the kernel runs.
#[derive(Debug)]
pub struct BinaryExpr {
    lhs: Arc<dyn PhysicalExpression>,
    op: Operator,
    rhs: Arc<dyn PhysicalExpression>,
}

impl BinaryExpr {
    pub fn new(
        lhs: Arc<dyn PhysicalExpression>,
        op: Operator,
        rhs: Arc<dyn PhysicalExpression>,
    ) -> Self {
        Self { lhs, op, rhs }
    }

    pub fn lhs(&self) -> &dyn PhysicalExpression {
        self.lhs.as_ref()
    }

    pub fn op(&self) -> &Operator {
        &self.op
    }

    pub fn rhs(&self) -> &dyn PhysicalExpression {
        self.rhs.as_ref()
    }
}

impl PhysicalExpression for BinaryExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn data_type(&self, schema: &Schema) -> Result<DataType> {
        let lhs = self.lhs.data_type(schema)?;
        let rhs = self.rhs.data_type(schema)?;
        Signature::get_result_type(&lhs, &self.op, &rhs)
    }

    fn eval(&self, input: &RecordBatch) -> Result<ColumnarValue> {
        use Operator::*;

        let num_rows = input.num_rows();
        let schema = input.schema();
        let (lhs_type, rhs_type) = Signature::get_input_types(
            &self.lhs.data_type(&schema)?,
            &self.op,
            &self.rhs.data_type(&schema)?,
        )?;

        if lhs_type == DataType::Null {
            let ret = Signature::get_result_type(&lhs_type, &self.op, &rhs_type)?;
            return Ok(ColumnarValue::Array(new_null_array(&ret, num_rows)));
        }

        let lhs = cast(&self.lhs.eval(input)?.into_array(num_rows)?, &lhs_type)?;
        let rhs = cast(&self.rhs.eval(input)?.into_array(num_rows)?, &rhs_type)?;

        let result: ArrayRef = match self.op {
            Eq => Arc::new(cmp::eq(&lhs, &rhs)?),
            NotEq => Arc::new(cmp::neq(&lhs, &rhs)?),
            Lt => Arc::new(cmp::lt(&lhs, &rhs)?),
            LtEq => Arc::new(cmp::lt_eq(&lhs, &rhs)?),
            Gt => Arc::new(cmp::gt(&lhs, &rhs)?),
            GtEq => Arc::new(cmp::gt_eq(&lhs, &rhs)?),
            And => Arc::new(and_kleene(lhs.as_boolean(), rhs.as_boolean())?),
            Or => Arc::new(or_kleene(lhs.as_boolean(), rhs.as_boolean())?),
            Plus => add_wrapping(&lhs, &rhs)?,
            Minus => sub_wrapping(&lhs, &rhs)?,
            Multiply => mul_wrapping(&lhs, &rhs)?,
            Divide => div(&lhs, &rhs)?,
        };

        Ok(ColumnarValue::Array(result))
    }
}

impl Display for BinaryExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_child(
            f: &mut std::fmt::Formatter<'_>,
            expr: &dyn PhysicalExpression,
        ) -> std::fmt::Result {
            if let Some(child) = expr.as_any().downcast_ref::<BinaryExpr>() {
                write!(f, "({})", child)
            } else {
                write!(f, "{}", expr)
            }
        }
        write_child(f, self.lhs.as_ref())?;
        write!(f, " {} ", self.op)?;
        write_child(f, self.rhs.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Array, AsArray, BooleanArray},
        datatypes::{DataType, Float64Type, Int64Type},
    };

    use crate::{
        expression::{
            operator::Operator,
            physical::{column::ColumnExpr, expr::PhysicalExpression, literal::LiteralExpr},
            values::ScalarValue,
        },
        tests::{create_record_batch, create_record_batch_with_nulls},
    };

    use super::BinaryExpr;

    fn column(name: &str, index: usize) -> Arc<dyn PhysicalExpression> {
        Arc::new(ColumnExpr::new(name, index))
    }

    fn literal(value: ScalarValue) -> Arc<dyn PhysicalExpression> {
        Arc::new(LiteralExpr::new(value))
    }

    #[test]
    fn test_binary_expr_comparison() {
        let batch = create_record_batch();
        let expr = BinaryExpr::new(
            column("c2", 1),
            Operator::GtEq,
            literal(ScalarValue::Int64(Some(2))),
        );

        let result = expr.eval(&batch).unwrap().into_array(2).unwrap();
        assert_eq!(result.as_boolean(), &BooleanArray::from(vec![false, true]));
        assert_eq!(expr.to_string(), "c2@1 >= 2");
    }

    #[test]
    fn test_binary_expr_mixed_arithmetic() {
        let batch = create_record_batch();
        let expr = BinaryExpr::new(
            column("c3", 2),
            Operator::Divide,
            literal(ScalarValue::Float64(Some(4.0))),
        );

        assert_eq!(expr.data_type(&batch.schema()).unwrap(), DataType::Float64);
        let result = expr.eval(&batch).unwrap().into_array(2).unwrap();
        let result = result.as_primitive::<Float64Type>();
        assert_eq!(result.values().to_vec(), vec![2.75, 5.5]);
    }

    #[test]
    fn test_binary_expr_propagates_nulls() {
        let batch = create_record_batch_with_nulls();
        let expr = BinaryExpr::new(column("c2", 1), Operator::Plus, column("c3", 2));

        let result = expr.eval(&batch).unwrap().into_array(3).unwrap();
        let result = result.as_primitive::<Int64Type>();
        assert!(result.is_null(0));
        assert_eq!(result.value(1), 13);
        assert!(result.is_null(2));
    }

    #[test]
    fn test_binary_expr_kleene_logic() {
        let batch = create_record_batch_with_nulls();
        let is_large = Arc::new(BinaryExpr::new(
            column("c3", 2),
            Operator::Gt,
            literal(ScalarValue::Int64(Some(15))),
        ));
        let expr = BinaryExpr::new(
            is_large,
            Operator::Or,
            literal(ScalarValue::Boolean(Some(true))),
        );

        let result = expr.eval(&batch).unwrap().into_array(3).unwrap();
        assert_eq!(
            result.as_boolean(),
            &BooleanArray::from(vec![true, true, true])
        );
    }

    #[test]
    fn test_binary_expr_null_literal() {
        let batch = create_record_batch();
        let expr = BinaryExpr::new(column("c1", 0), Operator::Eq, literal(ScalarValue::Null));

        let result = expr.eval(&batch).unwrap().into_array(2).unwrap();
        assert_eq!(result.null_count(), 2);
    }
}
