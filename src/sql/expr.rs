use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use itertools::Itertools;
use snafu::location;
use sqlparser::ast::{
    DuplicateTreatment, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Ident,
    UnaryOperator, Value,
};

use crate::{
    error::{Error, Result},
    expression::{
        logical::{
            aggregate::{Aggregate, AggregateFunction},
            binary::Binary,
            column::Column,
            expr::Expression,
            expr_fn::lit,
        },
        operator::Operator,
        values::ScalarValue,
    },
};

/// A table visible to the query, under its alias or name.
#[derive(Debug, Clone)]
struct ScopeTable {
    qualifier: String,
    schema: SchemaRef,
}

impl ScopeTable {
    fn has_column(&self, name: &str) -> bool {
        self.schema.column_with_name(name).is_some()
    }
}

/// The tables of a `FROM` clause in join order.
///
/// The dataframe resolves a column by its first occurrence in the joined
/// schema, so names are only accepted when that resolution is unambiguous.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    tables: Vec<ScopeTable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table to the scope.
    pub fn push(&mut self, qualifier: impl Into<String>, schema: SchemaRef) {
        self.tables.push(ScopeTable {
            qualifier: qualifier.into(),
            schema,
        });
    }

    /// Whether a table is visible under `qualifier`.
    pub fn has_table(&self, qualifier: &str) -> bool {
        self.tables.iter().any(|t| t.qualifier == qualifier)
    }

    /// Resolves a bare or table-qualified column name.
    pub fn resolve(&self, idents: &[Ident]) -> Result<Column> {
        match idents {
            [name] => {
                let owners = self.tables.iter().filter(|t| t.has_column(&name.value)).count();
                match owners {
                    0 => Err(Error::Reference {
                        message: format!("no such column: {}", name.value),
                        location: location!(),
                    }),
                    1 => Ok(Column::new(name.value.clone())),
                    _ => Err(Error::Reference {
                        message: format!("ambiguous column name: {}", name.value),
                        location: location!(),
                    }),
                }
            }
            [table, name] => {
                let position = self
                    .tables
                    .iter()
                    .position(|t| t.qualifier == table.value)
                    .ok_or_else(|| Error::Reference {
                        message: format!("no such table: {}", table.value),
                        location: location!(),
                    })?;
                if !self.tables[position].has_column(&name.value) {
                    return Err(Error::Reference {
                        message: format!("no such column: {}.{}", table.value, name.value),
                        location: location!(),
                    });
                }
                if self.tables[..position]
                    .iter()
                    .any(|t| t.has_column(&name.value))
                {
                    return Err(Error::Unsupported {
                        construct: format!(
                            "reference to shadowed column {}.{}",
                            table.value, name.value
                        ),
                        location: location!(),
                    });
                }
                Ok(Column::new(name.value.clone()))
            }
            _ => Err(Error::Unsupported {
                construct: format!(
                    "multi-part identifier {}",
                    idents.iter().map(|i| &i.value).join(".")
                ),
                location: location!(),
            }),
        }
    }

    /// All columns of the scope, or of one table when `qualifier` is given.
    ///
    /// A name shared by several tables cannot be selected one by one.
    pub fn columns(&self, qualifier: Option<&str>) -> Result<Vec<Expression>> {
        let idents = match qualifier {
            Some(qualifier) => {
                let table = self
                    .tables
                    .iter()
                    .find(|t| t.qualifier == qualifier)
                    .ok_or_else(|| Error::Reference {
                        message: format!("no such table: {qualifier}"),
                        location: location!(),
                    })?;
                table
                    .schema
                    .fields()
                    .iter()
                    .map(|f| vec![Ident::new(qualifier), Ident::new(f.name())])
                    .collect::<Vec<_>>()
            }
            None => self
                .tables
                .iter()
                .flat_map(|t| t.schema.fields().iter())
                .map(|f| vec![Ident::new(f.name())])
                .collect::<Vec<_>>(),
        };

        idents
            .iter()
            .map(|idents| match self.resolve(idents) {
                Ok(column) => Ok(Expression::Column(column)),
                Err(Error::Reference { .. }) | Err(Error::Unsupported { .. }) => {
                    Err(Error::Unsupported {
                        construct: format!(
                            "wildcard over duplicate column {}",
                            idents.iter().map(|i| &i.value).join(".")
                        ),
                        location: location!(),
                    })
                }
                Err(e) => Err(e),
            })
            .collect()
    }
}

/// Translates SQL expressions within a [`Scope`].
///
/// Select-list aliases may stand in for bare names; with `alias_first`
/// they shadow columns, otherwise they are only a fallback.
#[derive(Debug, Clone, Copy)]
pub struct ExprContext<'a> {
    scope: &'a Scope,
    aliases: &'a [(String, Expression)],
    alias_first: bool,
}

impl<'a> ExprContext<'a> {
    pub fn new(scope: &'a Scope) -> Self {
        Self {
            scope,
            aliases: &[],
            alias_first: false,
        }
    }

    /// Lets bare names refer to the given select-list aliases.
    pub fn with_aliases(self, aliases: &'a [(String, Expression)], alias_first: bool) -> Self {
        Self {
            aliases,
            alias_first,
            ..self
        }
    }

    pub fn sql_expr_to_logical_expr(&self, expr: &Expr) -> Result<Expression> {
        match expr {
            Expr::BinaryOp { left, op, right } => {
                let lhs = self.sql_expr_to_logical_expr(left)?;
                let rhs = self.sql_expr_to_logical_expr(right)?;
                let op = Operator::try_from(op)?;

                Ok(Expression::Binary(Binary::new(
                    Arc::new(lhs),
                    op,
                    Arc::new(rhs),
                )))
            }
            Expr::Identifier(ident) => self.resolve_identifier(ident),
            Expr::CompoundIdentifier(idents) => Ok(Expression::Column(self.scope.resolve(idents)?)),
            Expr::Nested(expr) => self.sql_expr_to_logical_expr(expr),
            Expr::IsNull(expr) => Ok(self.sql_expr_to_logical_expr(expr)?.is_null()),
            Expr::IsNotNull(expr) => Ok(self.sql_expr_to_logical_expr(expr)?.is_not_null()),
            Expr::UnaryOp { op, expr } => match op {
                UnaryOperator::Plus => self.sql_expr_to_logical_expr(expr),
                UnaryOperator::Minus => match self.sql_expr_to_logical_expr(expr)? {
                    Expression::Literal(ScalarValue::Int64(Some(v))) => Ok(lit(-v)),
                    Expression::Literal(ScalarValue::Float64(Some(v))) => Ok(lit(-v)),
                    other => Err(Error::Unsupported {
                        construct: format!("negation of '{other}'"),
                        location: location!(),
                    }),
                },
                other => Err(Error::Unsupported {
                    construct: format!("unary operator {other}"),
                    location: location!(),
                }),
            },
            Expr::Value(value) => parse_sql_value(value),
            Expr::Function(function) => self.parse_sql_function(function),
            other => Err(Error::Unsupported {
                construct: format!("expression '{other}'"),
                location: location!(),
            }),
        }
    }

    fn resolve_identifier(&self, ident: &Ident) -> Result<Expression> {
        let alias = self
            .aliases
            .iter()
            .find(|(name, _)| name == &ident.value)
            .map(|(_, expr)| expr.clone());

        match alias {
            Some(expr) if self.alias_first => Ok(expr),
            alias => match self.scope.resolve(std::slice::from_ref(ident)) {
                Ok(column) => Ok(Expression::Column(column)),
                Err(e) => alias.ok_or(e),
            },
        }
    }

    fn parse_sql_function(&self, function: &Function) -> Result<Expression> {
        if function.over.is_some() {
            return Err(Error::Unsupported {
                construct: "window function".to_string(),
                location: location!(),
            });
        }
        if function.filter.is_some() {
            return Err(Error::Unsupported {
                construct: "aggregate FILTER clause".to_string(),
                location: location!(),
            });
        }

        let func = match function.name.to_string().to_lowercase().as_str() {
            "count" => AggregateFunction::Count,
            "sum" => AggregateFunction::Sum,
            "avg" => AggregateFunction::Avg,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            _ => {
                return Err(Error::Unsupported {
                    construct: format!("function {}", function.name),
                    location: location!(),
                })
            }
        };

        let list = match &function.args {
            FunctionArguments::List(list) => list,
            _ => {
                return Err(Error::Unsupported {
                    construct: format!("arguments of {}", func.name()),
                    location: location!(),
                })
            }
        };
        if matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct)) {
            return Err(Error::Unsupported {
                construct: format!("{}(DISTINCT ...)", func.name()),
                location: location!(),
            });
        }

        let arg = match list.args.as_slice() {
            [arg] => arg,
            args => {
                return Err(Error::InvalidOperation {
                    message: format!(
                        "{} takes exactly one argument, got {}",
                        func.name(),
                        args.len()
                    ),
                    location: location!(),
                })
            }
        };
        let expr = match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => {
                self.sql_expr_to_logical_expr(expr)?
            }
            FunctionArg::Unnamed(FunctionArgExpr::Wildcard)
                if func == AggregateFunction::Count =>
            {
                lit(1)
            }
            other => {
                return Err(Error::Unsupported {
                    construct: format!("argument '{}' of {}", other, func.name()),
                    location: location!(),
                })
            }
        };

        Ok(Expression::Aggregate(Aggregate::new(func, Arc::new(expr))))
    }
}

fn parse_sql_value(value: &Value) -> Result<Expression> {
    match value {
        Value::Null => Ok(Expression::Literal(ScalarValue::Null)),
        Value::Boolean(b) => Ok(lit(*b)),
        Value::SingleQuotedString(s) => Ok(lit(s)),
        Value::Number(n, _) => {
            if let Ok(n) = n.parse::<i64>() {
                return Ok(lit(n));
            }
            if let Ok(n) = n.parse::<f64>() {
                return Ok(lit(n));
            }

            Err(Error::InvalidData {
                message: format!("Cannot parse number literal {n}"),
                location: location!(),
            })
        }
        other => Err(Error::Unsupported {
            construct: format!("literal {other}"),
            location: location!(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlparser::{ast::Expr, dialect::GenericDialect, parser::Parser};

    use crate::{
        error::Error,
        expression::logical::{
            expr::Expression,
            expr_fn::{col, count, lit, sum},
        },
        tests::create_schema,
    };

    use super::{ExprContext, Scope};

    fn parse(sql: &str) -> Expr {
        Parser::new(&GenericDialect {})
            .try_with_sql(sql)
            .unwrap()
            .parse_expr()
            .unwrap()
    }

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.push("simple", Arc::new(create_schema()));
        scope
    }

    #[test]
    fn test_sql_expr_to_logical_expr() {
        let scope = scope();
        let ctx = ExprContext::new(&scope);

        let cases = [
            ("c2 > 1 AND c1 = 'a'", col("c2").gt(lit(1)).and(col("c1").eq(lit("a")))),
            ("simple.c3 * 2.5", col("c3").multiply(lit(2.5))),
            ("(c2 + c3) / -2", col("c2").plus(col("c3")).divide(lit(-2))),
            ("c1 IS NOT NULL", col("c1").is_not_null()),
            ("COUNT(*)", count(lit(1))),
            ("sum(c2)", sum(col("c2"))),
        ];

        for (sql, expected) in cases {
            let expr = ctx.sql_expr_to_logical_expr(&parse(sql)).unwrap();
            assert_eq!(expr, expected, "{sql}");
        }
    }

    #[test]
    fn test_sql_expr_resolution_errors() {
        let scope = scope();
        let ctx = ExprContext::new(&scope);

        let result = ctx.sql_expr_to_logical_expr(&parse("c9 + 1"));
        assert!(matches!(result, Err(Error::Reference { .. })));

        let result = ctx.sql_expr_to_logical_expr(&parse("other.c1"));
        assert!(matches!(result, Err(Error::Reference { .. })));

        let result = ctx.sql_expr_to_logical_expr(&parse("UPPER(c1)"));
        assert!(matches!(result, Err(Error::Unsupported { .. })));

        let result = ctx.sql_expr_to_logical_expr(&parse("COUNT(DISTINCT c1)"));
        assert!(matches!(result, Err(Error::Unsupported { .. })));

        let result = ctx.sql_expr_to_logical_expr(&parse("c1 LIKE 'a%'"));
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_sql_expr_ambiguous_columns() {
        let mut scope = scope();
        scope.push("other", Arc::new(create_schema()));
        let ctx = ExprContext::new(&scope);

        let result = ctx.sql_expr_to_logical_expr(&parse("c1"));
        assert!(matches!(result, Err(Error::Reference { .. })));

        let expr = ctx.sql_expr_to_logical_expr(&parse("simple.c1")).unwrap();
        assert_eq!(expr, col("c1"));

        let result = ctx.sql_expr_to_logical_expr(&parse("other.c1"));
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_sql_expr_aliases() {
        let scope = scope();
        let aliases = vec![
            ("n".to_string(), count(col("c1"))),
            ("c2".to_string(), col("c3")),
        ];

        let ctx = ExprContext::new(&scope).with_aliases(&aliases, false);
        let expr = ctx.sql_expr_to_logical_expr(&parse("n >= 10")).unwrap();
        assert_eq!(expr, count(col("c1")).gt_eq(lit(10)));
        let expr = ctx.sql_expr_to_logical_expr(&parse("c2")).unwrap();
        assert_eq!(expr, col("c2"));

        let ctx = ExprContext::new(&scope).with_aliases(&aliases, true);
        let expr: Expression = ctx.sql_expr_to_logical_expr(&parse("c2")).unwrap();
        assert_eq!(expr, col("c3"));
    }
}
