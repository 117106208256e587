use std::{fmt::Display, sync::Arc};

use arrow::datatypes::{DataType, Field, Schema};
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::{coercion::Signature, operator::Operator, values::ScalarValue},
};

use super::{aggregate::Aggregate, alias::Alias, binary::Binary, column::Column, sort::Sort};

/// An expression in a logical plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// A reference to a named column.
    Column(Column),
    /// A constant value.
    Literal(ScalarValue),
    /// Two expressions combined by an [`Operator`].
    Binary(Binary),
    /// An aggregate function over an expression.
    Aggregate(Aggregate),
    /// A sort key.
    Sort(Sort),
    /// An expression with an explicit output name.
    Alias(Alias),
    /// Whether the expression is missing.
    IsNull(Arc<Expression>),
    /// Whether the expression is present.
    IsNotNull(Arc<Expression>),
}

impl Expression {
    /// The name of the column this expression produces.
    pub fn name(&self) -> String {
        match self {
            Expression::Column(column) => column.name().to_string(),
            Expression::Alias(alias) => alias.name().to_string(),
            other => other.to_string(),
        }
    }

    /// Resolves the [`DataType`] this expression evaluates to against `schema`.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expression::Column(column) => Ok(column.to_field(schema)?.data_type().clone()),
            Expression::Literal(value) => Ok(value.data_type()),
            Expression::Binary(binary) => {
                let lhs = binary.lhs().data_type(schema)?;
                let rhs = binary.rhs().data_type(schema)?;
                Signature::get_result_type(&lhs, binary.op(), &rhs)
            }
            Expression::Aggregate(aggregate) => {
                let input = aggregate.expression().data_type(schema)?;
                aggregate.func().result_type(&input)
            }
            Expression::Sort(sort) => sort.expression().data_type(schema),
            Expression::Alias(alias) => alias.expression().data_type(schema),
            Expression::IsNull(expr) | Expression::IsNotNull(expr) => {
                expr.data_type(schema)?;
                Ok(DataType::Boolean)
            }
        }
    }

    /// Resolves the output [`Field`] of this expression against `schema`.
    ///
    /// Every produced field is nullable.
    pub fn to_field(&self, schema: &Schema) -> Result<Field> {
        Ok(Field::new(self.name(), self.data_type(schema)?, true))
    }

    /// Whether an aggregate function appears anywhere in this expression.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate(_) => true,
            Expression::Column(_) | Expression::Literal(_) => false,
            Expression::Binary(binary) => {
                binary.lhs().contains_aggregate() || binary.rhs().contains_aggregate()
            }
            Expression::Sort(sort) => sort.expression().contains_aggregate(),
            Expression::Alias(alias) => alias.expression().contains_aggregate(),
            Expression::IsNull(expr) | Expression::IsNotNull(expr) => expr.contains_aggregate(),
        }
    }

    /// Fails with an invalid-operation error if an aggregate function
    /// appears in this expression.
    pub fn ensure_no_aggregate(&self, context: &str) -> Result<()> {
        if self.contains_aggregate() {
            return Err(Error::InvalidOperation {
                message: format!("Aggregate expression '{self}' is not allowed in {context}"),
                location: location!(),
            });
        }
        Ok(())
    }

    /// Removes a top-level alias.
    pub fn unalias(&self) -> &Expression {
        match self {
            Expression::Alias(alias) => alias.expression(),
            other => other,
        }
    }

    /// Rebuilds the expression top-down, replacing every subexpression
    /// for which `f` returns a value. Replacements are not revisited.
    pub fn transform_down<F>(&self, f: &F) -> Expression
    where
        F: Fn(&Expression) -> Option<Expression>,
    {
        if let Some(expr) = f(self) {
            return expr;
        }

        match self {
            Expression::Column(_) | Expression::Literal(_) => self.clone(),
            Expression::Binary(binary) => Expression::Binary(Binary::new(
                Arc::new(binary.lhs().transform_down(f)),
                *binary.op(),
                Arc::new(binary.rhs().transform_down(f)),
            )),
            Expression::Aggregate(aggregate) => Expression::Aggregate(Aggregate::new(
                *aggregate.func(),
                Arc::new(aggregate.expression().transform_down(f)),
            )),
            Expression::Sort(sort) => Expression::Sort(Sort::new(
                Arc::new(sort.expression().transform_down(f)),
                sort.ascending(),
            )),
            Expression::Alias(alias) => Expression::Alias(Alias::new(
                Arc::new(alias.expression().transform_down(f)),
                alias.name(),
            )),
            Expression::IsNull(expr) => Expression::IsNull(Arc::new(expr.transform_down(f))),
            Expression::IsNotNull(expr) => Expression::IsNotNull(Arc::new(expr.transform_down(f))),
        }
    }

    /// The columns referenced by this expression, in order of appearance.
    pub fn column_refs(&self) -> Vec<&Column> {
        let mut columns = vec![];
        self.walk(&mut |expr| {
            if let Expression::Column(column) = expr {
                columns.push(column);
            }
            true
        });
        columns
    }

    /// The outermost aggregate calls in this expression, in order of appearance.
    pub fn aggregates(&self) -> Vec<&Expression> {
        let mut aggregates = vec![];
        self.walk(&mut |expr| match expr {
            Expression::Aggregate(_) => {
                aggregates.push(expr);
                false
            }
            _ => true,
        });
        aggregates
    }

    /// Visits the expression tree pre-order; children are skipped
    /// when `f` returns false.
    fn walk<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Expression) -> bool,
    {
        if !f(self) {
            return;
        }

        match self {
            Expression::Column(_) | Expression::Literal(_) => {}
            Expression::Binary(binary) => {
                binary.lhs().walk(f);
                binary.rhs().walk(f);
            }
            Expression::Aggregate(aggregate) => aggregate.expression().walk(f),
            Expression::Sort(sort) => sort.expression().walk(f),
            Expression::Alias(alias) => alias.expression().walk(f),
            Expression::IsNull(expr) | Expression::IsNotNull(expr) => expr.walk(f),
        }
    }

    /// Renders the expression as builder calls, e.g. `col("a").gt(lit(1))`.
    pub fn to_pipeline(&self) -> String {
        match self {
            Expression::Column(column) => format!("col({:?})", column.name()),
            Expression::Literal(value) => literal_to_pipeline(value),
            Expression::Binary(binary) => binary.to_pipeline(),
            Expression::Aggregate(aggregate) => format!(
                "{}({})",
                aggregate.func().method_name(),
                aggregate.expression().to_pipeline()
            ),
            Expression::Sort(sort) => sort.to_pipeline(),
            Expression::Alias(alias) => {
                format!("{}.alias({:?})", alias.expression().to_pipeline(), alias.name())
            }
            Expression::IsNull(expr) => format!("{}.is_null()", expr.to_pipeline()),
            Expression::IsNotNull(expr) => format!("{}.is_not_null()", expr.to_pipeline()),
        }
    }

    fn binary(self, op: Operator, rhs: Expression) -> Expression {
        Expression::Binary(Binary::new(Arc::new(self), op, Arc::new(rhs)))
    }

    pub fn eq(self, other: Expression) -> Expression {
        self.binary(Operator::Eq, other)
    }

    pub fn not_eq(self, other: Expression) -> Expression {
        self.binary(Operator::NotEq, other)
    }

    pub fn lt(self, other: Expression) -> Expression {
        self.binary(Operator::Lt, other)
    }

    pub fn lt_eq(self, other: Expression) -> Expression {
        self.binary(Operator::LtEq, other)
    }

    pub fn gt(self, other: Expression) -> Expression {
        self.binary(Operator::Gt, other)
    }

    pub fn gt_eq(self, other: Expression) -> Expression {
        self.binary(Operator::GtEq, other)
    }

    pub fn and(self, other: Expression) -> Expression {
        self.binary(Operator::And, other)
    }

    pub fn or(self, other: Expression) -> Expression {
        self.binary(Operator::Or, other)
    }

    pub fn plus(self, other: Expression) -> Expression {
        self.binary(Operator::Plus, other)
    }

    pub fn minus(self, other: Expression) -> Expression {
        self.binary(Operator::Minus, other)
    }

    pub fn multiply(self, other: Expression) -> Expression {
        self.binary(Operator::Multiply, other)
    }

    pub fn divide(self, other: Expression) -> Expression {
        self.binary(Operator::Divide, other)
    }

    pub fn is_null(self) -> Expression {
        Expression::IsNull(Arc::new(self))
    }

    pub fn is_not_null(self) -> Expression {
        Expression::IsNotNull(Arc::new(self))
    }

    /// Names the output of this expression.
    pub fn alias(self, name: impl Into<String>) -> Expression {
        Expression::Alias(Alias::new(Arc::new(self), name))
    }

    /// Turns this expression into a sort key; missing values sort first
    /// when ascending and last when descending.
    pub fn sort(self, ascending: bool) -> Expression {
        Expression::Sort(Sort::new(Arc::new(self), ascending))
    }
}

fn literal_to_pipeline(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Boolean(Some(v)) => format!("lit({v})"),
        ScalarValue::Int64(Some(v)) => format!("lit({v})"),
        ScalarValue::Float64(Some(v)) => format!("lit({v:?})"),
        ScalarValue::Utf8(Some(v)) => format!("lit({v:?})"),
        _ => "lit(ScalarValue::Null)".to_string(),
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Column(column) => write!(f, "{}", column),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Binary(binary) => write!(f, "{}", binary),
            Expression::Aggregate(aggregate) => write!(f, "{}", aggregate),
            Expression::Sort(sort) => write!(f, "{}", sort),
            Expression::Alias(alias) => write!(f, "{}", alias),
            Expression::IsNull(expr) => write!(f, "{} IS NULL", expr),
            Expression::IsNotNull(expr) => write!(f, "{} IS NOT NULL", expr),
        }
    }
}
