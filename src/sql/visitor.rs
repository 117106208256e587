use std::ops::ControlFlow;

use crate::error::{Error, Result};

use snafu::location;
use sqlparser::ast::{Expr, Statement, Visit, Visitor};
use tracing::debug;

/// Stops at the first function call carrying an `OVER (...)` clause.
struct WindowFunctionVisitor;

impl Visitor for WindowFunctionVisitor {
    type Break = String;

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Function(function) if function.over.is_some() => {
                ControlFlow::Break(function.to_string())
            }
            _ => ControlFlow::Continue(()),
        }
    }
}

/// Fails with an unsupported-construct error if `statement` calls a
/// window function anywhere, including inside subqueries.
pub fn reject_window_functions(statement: &Statement) -> Result<()> {
    match statement.visit(&mut WindowFunctionVisitor) {
        ControlFlow::Break(function) => {
            debug!(%function, "found window function");
            Err(Error::Unsupported {
                construct: "window function".to_string(),
                location: location!(),
            })
        }
        ControlFlow::Continue(()) => Ok(()),
    }
}
