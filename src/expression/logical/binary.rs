use std::{fmt::Display, sync::Arc};

use crate::expression::operator::Operator;

use super::expr::Expression;

/// `lhs op rhs`, for comparisons, boolean connectives and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    lhs: Arc<Expression>,
    op: Operator,
    rhs: Arc<Expression>,
}

impl Binary {
    pub fn new(lhs: Arc<Expression>, op: Operator, rhs: Arc<Expression>) -> Self {
        Self { lhs, op, rhs }
    }

    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    pub fn op(&self) -> &Operator {
        &self.op
    }

    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    /// Renders the expression as a method call on its left operand,
    /// e.g. `col("a").gt_eq(lit(1))`.
    pub fn to_pipeline(&self) -> String {
        format!(
            "{}.{}({})",
            self.lhs.to_pipeline(),
            self.op.method_name(),
            self.rhs.to_pipeline()
        )
    }
}

impl Display for Binary {
    /// Nested binary operands are parenthesized, so the output parses back
    /// to the same tree regardless of precedence.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operand = |expr: &Expression| match expr {
            Expression::Binary(child) => format!("({child})"),
            other => other.to_string(),
        };
        write!(f, "{} {} {}", operand(&self.lhs), self.op, operand(&self.rhs))
    }
}
