use snafu::location;
use sqlparser::ast::{
    Expr, GroupByExpr, Offset, OrderBy, Query, Select, SelectItem, SetExpr, TableFactor,
    TableWithJoins, Value,
};
use tracing::debug;

use crate::{
    error::{Error, Result},
    execution::{context::SessionContext, dataframe::DataFrame},
    expression::logical::{expr::Expression, expr_fn::col},
    plan::logical::plan::LogicalPlan,
};

use super::{
    expr::{ExprContext, Scope},
    join::parse_join_relation,
};

/// A translated select-list entry.
#[derive(Debug, Clone)]
struct SelectExpr {
    expr: Expression,
    alias: Option<String>,
}

impl SelectExpr {
    /// The final projection expression, aliased only when the name changes.
    fn to_projection(&self, expr: Expression) -> Expression {
        match &self.alias {
            Some(alias) if &expr.name() != alias => expr.alias(alias),
            _ => expr,
        }
    }
}

fn unsupported(construct: impl Into<String>) -> Error {
    Error::Unsupported {
        construct: construct.into(),
        location: location!(),
    }
}

/// Plans a single `SELECT` query.
///
/// Stages are applied in the order
/// join, filter, aggregate, having, sort, limit, projection.
pub fn query_to_plan(ctx: &SessionContext, query: Query) -> Result<LogicalPlan> {
    if query.with.is_some() {
        return Err(unsupported("WITH clause"));
    }
    if query.fetch.is_some() || !query.limit_by.is_empty() || !query.locks.is_empty() {
        return Err(unsupported(format!("query modifiers in '{query}'")));
    }

    let select = match *query.body {
        SetExpr::Select(select) => select,
        SetExpr::SetOperation { op, .. } => return Err(unsupported(format!("{op} set operation"))),
        SetExpr::Query(_) => return Err(unsupported("nested query")),
        SetExpr::Values(_) => return Err(unsupported("VALUES")),
        other => return Err(unsupported(format!("query body '{other}'"))),
    };
    check_select_clauses(&select)?;

    let (df, scope) = plan_from_tables(ctx, &select.from)?;
    let df = plan_from_selection(df, &scope, select.selection.as_ref())?;

    let base = ExprContext::new(&scope);
    let mut items = vec![];
    for item in select.projection.iter() {
        items.extend(parse_select_item(&base, &scope, item)?);
    }
    let plain_wildcard = matches!(select.projection.as_slice(), [SelectItem::Wildcard(_)]);

    let aliases = items
        .iter()
        .filter_map(|item| item.alias.clone().map(|alias| (alias, item.expr.clone())))
        .collect::<Vec<_>>();
    let fallback = base.with_aliases(&aliases, false);
    let preferred = base.with_aliases(&aliases, true);

    let group_by = match &select.group_by {
        GroupByExpr::Expressions(exprs, modifiers) if modifiers.is_empty() => exprs
            .iter()
            .map(|expr| fallback.sql_expr_to_logical_expr(expr))
            .collect::<Result<Vec<_>>>()?,
        other => return Err(unsupported(format!("{other}"))),
    };
    let having = select
        .having
        .as_ref()
        .map(|expr| fallback.sql_expr_to_logical_expr(expr))
        .transpose()?;
    let order_by = match &query.order_by {
        Some(order_by) => parse_order_by(&preferred, order_by, &items)?,
        None => vec![],
    };

    let is_aggregate = !group_by.is_empty()
        || items.iter().any(|item| item.expr.contains_aggregate())
        || having.iter().any(|expr| expr.contains_aggregate())
        || order_by.iter().any(|expr| expr.contains_aggregate());

    let (df, order_by, projection) = if is_aggregate {
        plan_aggregate(df, group_by, having, order_by, &items)?
    } else {
        if having.is_some() {
            return Err(Error::InvalidOperation {
                message: "a GROUP BY clause is required before HAVING".to_string(),
                location: location!(),
            });
        }
        let projection = items
            .iter()
            .map(|item| item.to_projection(item.expr.clone()))
            .collect::<Vec<_>>();
        (df, order_by, projection)
    };

    let df = match order_by.is_empty() {
        true => df,
        false => df.order_by(order_by)?,
    };
    let df = plan_limit(df, query.limit.as_ref(), query.offset.as_ref())?;
    let df = match plain_wildcard && !is_aggregate {
        true => df,
        false => df.select(projection)?,
    };

    debug!(plan = %df.logical_plan(), "planned select statement");
    Ok(df.into_logical_plan())
}

fn check_select_clauses(select: &Select) -> Result<()> {
    if select.distinct.is_some() {
        return Err(unsupported("SELECT DISTINCT"));
    }
    if select.top.is_some() {
        return Err(unsupported("TOP"));
    }
    if select.into.is_some() {
        return Err(unsupported("SELECT INTO"));
    }
    if !select.lateral_views.is_empty() {
        return Err(unsupported("LATERAL VIEW"));
    }
    if !select.named_window.is_empty() {
        return Err(unsupported("window function"));
    }
    if select.qualify.is_some() {
        return Err(unsupported("QUALIFY"));
    }
    if !select.cluster_by.is_empty()
        || !select.distribute_by.is_empty()
        || !select.sort_by.is_empty()
    {
        return Err(unsupported("CLUSTER BY, DISTRIBUTE BY or SORT BY"));
    }
    Ok(())
}

/// Resolves a table reference to a dataframe scan and the name
/// its columns are qualified with.
pub fn create_relation(ctx: &SessionContext, relation: &TableFactor) -> Result<(DataFrame, String)> {
    match relation {
        TableFactor::Table {
            name, alias, args, ..
        } => {
            if args.is_some() {
                return Err(unsupported(format!("table function {name}")));
            }
            let table = match name.0.as_slice() {
                [ident] => ident.value.clone(),
                _ => return Err(unsupported(format!("qualified table name {name}"))),
            };
            let df = ctx.table(&table)?;

            let qualifier = match alias {
                Some(alias) if !alias.columns.is_empty() => {
                    return Err(unsupported(format!("column aliases in '{alias}'")))
                }
                Some(alias) => alias.name.value.clone(),
                None => table,
            };
            Ok((df, qualifier))
        }
        TableFactor::Derived { .. } => Err(unsupported("subquery in FROM")),
        other => Err(unsupported(format!("table reference '{other}'"))),
    }
}

fn plan_from_tables(ctx: &SessionContext, from: &[TableWithJoins]) -> Result<(DataFrame, Scope)> {
    let from = match from {
        [from] => from,
        [] => return Err(unsupported("SELECT without FROM")),
        _ => return Err(unsupported("comma-separated FROM list")),
    };

    let (mut df, qualifier) = create_relation(ctx, &from.relation)?;
    let mut scope = Scope::new();
    scope.push(qualifier, df.schema());

    for join in from.joins.iter() {
        df = parse_join_relation(ctx, df, &mut scope, join)?;
    }

    Ok((df, scope))
}

fn plan_from_selection(df: DataFrame, scope: &Scope, selection: Option<&Expr>) -> Result<DataFrame> {
    match selection {
        Some(expr) => {
            let predicate = ExprContext::new(scope).sql_expr_to_logical_expr(expr)?;
            df.filter(predicate)
        }
        None => Ok(df),
    }
}

fn parse_select_item(
    ctx: &ExprContext<'_>,
    scope: &Scope,
    item: &SelectItem,
) -> Result<Vec<SelectExpr>> {
    let items = match item {
        SelectItem::UnnamedExpr(expr) => vec![SelectExpr {
            expr: ctx.sql_expr_to_logical_expr(expr)?,
            alias: None,
        }],
        SelectItem::ExprWithAlias { expr, alias } => vec![SelectExpr {
            expr: ctx.sql_expr_to_logical_expr(expr)?,
            alias: Some(alias.value.clone()),
        }],
        SelectItem::Wildcard(_) => wildcard(scope.columns(None)?),
        SelectItem::QualifiedWildcard(name, _) => match name.0.as_slice() {
            [table] => wildcard(scope.columns(Some(&table.value))?),
            _ => return Err(unsupported(format!("wildcard {name}.*"))),
        },
    };

    Ok(items)
}

fn wildcard(columns: Vec<Expression>) -> Vec<SelectExpr> {
    columns
        .into_iter()
        .map(|expr| SelectExpr { expr, alias: None })
        .collect()
}

/// Translates `ORDER BY` into sort expressions. Select-list aliases take
/// precedence over columns, and integer literals are 1-based positions
/// into the select list.
fn parse_order_by(
    ctx: &ExprContext<'_>,
    order_by: &OrderBy,
    items: &[SelectExpr],
) -> Result<Vec<Expression>> {
    if order_by.interpolate.is_some() {
        return Err(unsupported("INTERPOLATE"));
    }

    order_by
        .exprs
        .iter()
        .map(|order| -> Result<Expression> {
            if order.nulls_first.is_some() {
                return Err(unsupported("NULLS FIRST/LAST"));
            }
            if order.with_fill.is_some() {
                return Err(unsupported("WITH FILL"));
            }

            let expr = match &order.expr {
                Expr::Value(Value::Number(n, _)) => {
                    let item = n
                        .parse::<usize>()
                        .ok()
                        .and_then(|position| position.checked_sub(1))
                        .and_then(|index| items.get(index))
                        .ok_or_else(|| Error::InvalidOperation {
                            message: format!(
                                "ORDER BY term {n} is out of range, expected 1 to {}",
                                items.len()
                            ),
                            location: location!(),
                        })?;
                    item.expr.clone()
                }
                expr => ctx.sql_expr_to_logical_expr(expr)?,
            };

            Ok(expr.sort(order.asc.unwrap_or(true)))
        })
        .collect()
}

/// Plans the aggregate and rewrites the later stages to read its output.
///
/// Aliased aggregates in the select list name their output column; every
/// other aggregate keeps its default name. Grouping expressions and
/// aggregates are replaced by references to the aggregate output, and any
/// column left over must then be part of that output.
fn plan_aggregate(
    df: DataFrame,
    group_by: Vec<Expression>,
    having: Option<Expression>,
    order_by: Vec<Expression>,
    items: &[SelectExpr],
) -> Result<(DataFrame, Vec<Expression>, Vec<Expression>)> {
    let mut outputs: Vec<(Expression, String)> = vec![];
    let mut aggregate_expressions = vec![];
    let mut register = |aggregate: &Expression, alias: Option<&String>| {
        if outputs.iter().any(|(expr, _)| expr == aggregate) {
            return;
        }
        let expr = match alias {
            Some(alias) => aggregate.clone().alias(alias),
            None => aggregate.clone(),
        };
        outputs.push((aggregate.clone(), expr.name()));
        aggregate_expressions.push(expr);
    };

    for item in items.iter() {
        match (&item.expr, &item.alias) {
            (Expression::Aggregate(_), Some(alias)) => register(&item.expr, Some(alias)),
            _ => item
                .expr
                .aggregates()
                .into_iter()
                .for_each(|aggregate| register(aggregate, None)),
        }
    }
    for expr in having.iter().chain(order_by.iter()) {
        expr.aggregates()
            .into_iter()
            .for_each(|aggregate| register(aggregate, None));
    }

    let df = df.aggregate(group_by.clone(), aggregate_expressions)?;
    let schema = df.schema();

    let rewrite = |expr: &Expression| -> Result<Expression> {
        let rewritten = expr.transform_down(&|e| {
            if let Some(group) = group_by.iter().find(|group| *group == e) {
                return Some(col(group.name()));
            }
            outputs
                .iter()
                .find(|(aggregate, _)| aggregate == e)
                .map(|(_, name)| col(name))
        });

        let ungrouped = rewritten
            .column_refs()
            .into_iter()
            .find(|column| schema.column_with_name(column.name()).is_none())
            .map(|column| column.name().to_string());

        match ungrouped {
            Some(name) => Err(Error::InvalidOperation {
                message: format!(
                    "column '{name}' must appear in the GROUP BY clause or be used in an aggregate function"
                ),
                location: location!(),
            }),
            None => Ok(rewritten),
        }
    };

    let df = match having {
        Some(having) => df.filter(rewrite(&having)?)?,
        None => df,
    };
    let order_by = order_by
        .iter()
        .map(|expr| rewrite(expr))
        .collect::<Result<Vec<_>>>()?;
    let projection = items
        .iter()
        .map(|item| -> Result<Expression> { Ok(item.to_projection(rewrite(&item.expr)?)) })
        .collect::<Result<Vec<_>>>()?;

    Ok((df, order_by, projection))
}

fn plan_limit(df: DataFrame, limit: Option<&Expr>, offset: Option<&Offset>) -> Result<DataFrame> {
    let fetch = limit.map(|expr| literal_count(expr, "LIMIT")).transpose()?;
    let skip = offset
        .map(|offset| literal_count(&offset.value, "OFFSET"))
        .transpose()?;

    match (skip, fetch) {
        (None, None) => Ok(df),
        (skip, fetch) => Ok(df.limit(skip.unwrap_or(0), fetch)),
    }
}

fn literal_count(expr: &Expr, clause: &str) -> Result<usize> {
    match expr {
        Expr::Value(Value::Number(n, _)) => n.parse::<usize>().map_err(|_| Error::InvalidData {
            message: format!("{clause} expects a non-negative integer, got {n}"),
            location: location!(),
        }),
        _ => Err(unsupported(format!("non-literal {clause}"))),
    }
}
