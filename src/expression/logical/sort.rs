use std::{fmt::Display, sync::Arc};

use super::expr::Expression;

/// A sort key: an expression and its direction.
///
/// The null placement is not configurable, missing values come first when
/// ascending and last when descending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    expression: Arc<Expression>,
    ascending: bool,
}

impl Sort {
    pub fn new(expression: Arc<Expression>, ascending: bool) -> Self {
        Self {
            expression,
            ascending,
        }
    }

    /// The expression the rows are ordered by.
    pub fn expression(&self) -> &Expression {
        self.expression.as_ref()
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn nulls_first(&self) -> bool {
        self.ascending
    }

    /// Renders the key as `expr.sort(ascending)`.
    pub fn to_pipeline(&self) -> String {
        format!("{}.sort({})", self.expression.to_pipeline(), self.ascending)
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ascending {
            true => write!(f, "{} ASC NULLS FIRST", self.expression),
            false => write!(f, "{} DESC NULLS LAST", self.expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::logical::{expr::Expression, expr_fn::col};

    #[test]
    fn test_sort_key_rendering() {
        let Expression::Sort(key) = col("num_lines").sort(false) else {
            panic!("expected a sort key");
        };
        assert!(!key.nulls_first());
        assert_eq!(key.to_string(), "num_lines DESC NULLS LAST");
        assert_eq!(key.to_pipeline(), r#"col("num_lines").sort(false)"#);

        let Expression::Sort(key) = col("city").sort(true) else {
            panic!("expected a sort key");
        };
        assert!(key.nulls_first());
        assert_eq!(key.to_string(), "city ASC NULLS FIRST");
    }
}
