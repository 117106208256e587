use std::sync::Arc;

use crate::expression::{operator::Operator, values::ScalarValue};

use super::{
    aggregate::{Aggregate, AggregateFunction},
    binary::Binary,
    column::Column,
    expr::Expression,
};

/// Creates an [`Expression::Column`] with provided `name`.
pub fn col(name: impl Into<String>) -> Expression {
    Expression::Column(Column::new(name))
}

/// Creates an [`Expression::Binary`] with provided expressions and operator.
pub fn binary_expr(lhs: Expression, op: Operator, rhs: Expression) -> Expression {
    Expression::Binary(Binary::new(Arc::new(lhs), op, Arc::new(rhs)))
}

macro_rules! make_aggregate_expr {
    ($name:ident, $f:ident) => {
        pub fn $name(expr: Expression) -> Expression {
            Expression::Aggregate(Aggregate::new(AggregateFunction::$f, Arc::new(expr)))
        }
    };
}

make_aggregate_expr!(count, Count);
make_aggregate_expr!(sum, Sum);
make_aggregate_expr!(avg, Avg);
make_aggregate_expr!(min, Min);
make_aggregate_expr!(max, Max);

/// Creates an [`Expression::Literal`].
pub fn lit<T: LiteralExt>(value: T) -> Expression {
    value.lit()
}

/// An extension trait for returning [`Expression::Literal`].
pub trait LiteralExt {
    fn lit(&self) -> Expression;
}

macro_rules! make_lit {
    ($ty:ident, $scalar:ident, $native:ident) => {
        impl LiteralExt for $ty {
            fn lit(&self) -> Expression {
                Expression::Literal(ScalarValue::$scalar(Some(*self as $native)))
            }
        }
    };
}

make_lit!(i32, Int64, i64);
make_lit!(i64, Int64, i64);
make_lit!(u32, Int64, i64);
make_lit!(f32, Float64, f64);
make_lit!(f64, Float64, f64);

impl LiteralExt for bool {
    fn lit(&self) -> Expression {
        Expression::Literal(ScalarValue::Boolean(Some(*self)))
    }
}

impl LiteralExt for ScalarValue {
    fn lit(&self) -> Expression {
        Expression::Literal(self.clone())
    }
}

impl LiteralExt for String {
    fn lit(&self) -> Expression {
        Expression::Literal(ScalarValue::Utf8(Some(self.clone())))
    }
}

impl LiteralExt for &String {
    fn lit(&self) -> Expression {
        Expression::Literal(ScalarValue::Utf8(Some(self.to_string())))
    }
}

impl LiteralExt for &str {
    fn lit(&self) -> Expression {
        Expression::Literal(ScalarValue::Utf8(Some(self.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::{logical::expr::Expression, values::ScalarValue};

    use super::lit;

    #[test]
    fn test_lit_widens_numbers() {
        assert_eq!(lit(10), Expression::Literal(ScalarValue::Int64(Some(10))));
        assert_eq!(lit(0.5f32), Expression::Literal(ScalarValue::Float64(Some(0.5))));
        assert_eq!(lit("GB"), Expression::Literal(ScalarValue::Utf8(Some("GB".to_string()))));
        assert_eq!(lit(ScalarValue::Null), Expression::Literal(ScalarValue::Null));
    }
}
