use std::fmt::Display;

use snafu::location;
use sqlparser::ast::BinaryOperator;

use crate::error::{Error, Result};

/// The binary operators an [`Expression`] can apply.
///
/// [`Expression`]: crate::expression::logical::expr::Expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
    And,
    Or,
}

impl Operator {
    /// The expression builder method applying this operator.
    pub fn method_name(&self) -> &'static str {
        use Operator::*;

        match self {
            Eq => "eq",
            NotEq => "not_eq",
            Lt => "lt",
            LtEq => "lt_eq",
            Gt => "gt",
            GtEq => "gt_eq",
            Plus => "plus",
            Minus => "minus",
            Multiply => "multiply",
            Divide => "divide",
            And => "and",
            Or => "or",
        }
    }
}

impl TryFrom<&BinaryOperator> for Operator {
    type Error = Error;

    fn try_from(op: &BinaryOperator) -> Result<Self> {
        Ok(match op {
            BinaryOperator::Eq => Operator::Eq,
            BinaryOperator::NotEq => Operator::NotEq,
            BinaryOperator::Lt => Operator::Lt,
            BinaryOperator::LtEq => Operator::LtEq,
            BinaryOperator::Gt => Operator::Gt,
            BinaryOperator::GtEq => Operator::GtEq,
            BinaryOperator::Plus => Operator::Plus,
            BinaryOperator::Minus => Operator::Minus,
            BinaryOperator::Multiply => Operator::Multiply,
            BinaryOperator::Divide => Operator::Divide,
            BinaryOperator::And => Operator::And,
            BinaryOperator::Or => Operator::Or,
            other => {
                return Err(Error::Unsupported {
                    construct: format!("operator {other}"),
                    location: location!(),
                })
            }
        })
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Operator::*;

        let symbol = match self {
            Eq => "=",
            NotEq => "!=",
            Lt => "<",
            LtEq => "<=",
            Gt => ">",
            GtEq => ">=",
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            And => "AND",
            Or => "OR",
        };
        f.write_str(symbol)
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::ast::BinaryOperator;

    use crate::error::Error;

    use super::Operator;

    #[test]
    fn test_operator_from_sql() {
        let op = Operator::try_from(&BinaryOperator::GtEq).unwrap();
        assert_eq!(op, Operator::GtEq);
        assert_eq!((op.to_string(), op.method_name()), (">=".to_string(), "gt_eq"));

        match Operator::try_from(&BinaryOperator::Modulo) {
            Err(Error::Unsupported { construct, .. }) => assert_eq!(construct, "operator %"),
            other => panic!("expected unsupported operator, got {other:?}"),
        }
    }
}
