use std::{fmt::Display, sync::Arc};

use super::expr::Expression;

/// An [`Expression`] renamed in the output schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias {
    expression: Arc<Expression>,
    name: String,
}

impl Alias {
    /// Creates a new [`Alias`] instance.
    pub fn new(expression: Arc<Expression>, name: impl Into<String>) -> Self {
        Self {
            expression,
            name: name.into(),
        }
    }

    pub fn expression(&self) -> &Expression {
        self.expression.as_ref()
    }

    /// The output name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} AS {}", self.expression, self.name)
    }
}
