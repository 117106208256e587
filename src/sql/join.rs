use snafu::location;
use sqlparser::ast::{BinaryOperator, Expr, Ident, Join as SQLJoin, JoinConstraint, JoinOperator};

use crate::{
    error::{Error, Result},
    execution::{context::SessionContext, dataframe::DataFrame},
    expression::logical::column::Column,
    plan::logical::join::JoinType,
};

use super::{expr::Scope, select::create_relation};

/// Which join input a key column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Joins the relation of `join` onto `lhs` and adds it to `scope`.
pub fn parse_join_relation(
    ctx: &SessionContext,
    lhs: DataFrame,
    scope: &mut Scope,
    join: &SQLJoin,
) -> Result<DataFrame> {
    let (join_type, constraint) = match &join.join_operator {
        JoinOperator::Inner(constraint) => (JoinType::Inner, constraint),
        JoinOperator::LeftOuter(constraint) => (JoinType::Left, constraint),
        _ => {
            return Err(Error::Unsupported {
                construct: format!("join '{}'", join.to_string().trim()),
                location: location!(),
            })
        }
    };
    let condition = match constraint {
        JoinConstraint::On(expr) => expr,
        _ => {
            return Err(Error::Unsupported {
                construct: format!("join without ON condition '{}'", join.to_string().trim()),
                location: location!(),
            })
        }
    };

    let (rhs, qualifier) = create_relation(ctx, &join.relation)?;
    let mut right_scope = Scope::new();
    right_scope.push(qualifier.clone(), rhs.schema());

    let (left_keys, right_keys): (Vec<Column>, Vec<Column>) =
        parse_join_keys(condition, scope, &right_scope)?
            .into_iter()
            .unzip();
    let left_keys = left_keys.iter().map(|c| c.name()).collect::<Vec<_>>();
    let right_keys = right_keys.iter().map(|c| c.name()).collect::<Vec<_>>();

    let schema = rhs.schema();
    let df = lhs.join(rhs, join_type, &left_keys, &right_keys)?;
    scope.push(qualifier, schema);

    Ok(df)
}

/// Splits an `ON` condition into (left, right) key pairs.
///
/// The condition must be an equality of two columns or a conjunction of
/// such equalities; each equality may name its sides in either order.
fn parse_join_keys(condition: &Expr, left: &Scope, right: &Scope) -> Result<Vec<(Column, Column)>> {
    let mut conjuncts = vec![];
    split_conjunction(condition, &mut conjuncts);

    conjuncts
        .into_iter()
        .map(|expr| -> Result<(Column, Column)> {
            let unsupported = || Error::Unsupported {
                construct: format!("join condition '{expr}'"),
                location: location!(),
            };

            let (a, b) = match expr {
                Expr::BinaryOp {
                    left: a,
                    op: BinaryOperator::Eq,
                    right: b,
                } => (
                    column_idents(a).ok_or_else(unsupported)?,
                    column_idents(b).ok_or_else(unsupported)?,
                ),
                _ => return Err(unsupported()),
            };

            match (key_side(a, left, right)?, key_side(b, left, right)?) {
                ((Side::Left, l), (Side::Right, r)) | ((Side::Right, r), (Side::Left, l)) => {
                    Ok((l, r))
                }
                _ => Err(unsupported()),
            }
        })
        .collect()
}

fn split_conjunction<'a>(expr: &'a Expr, conjuncts: &mut Vec<&'a Expr>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            split_conjunction(left, conjuncts);
            split_conjunction(right, conjuncts);
        }
        Expr::Nested(expr) => split_conjunction(expr, conjuncts),
        other => conjuncts.push(other),
    }
}

fn column_idents(expr: &Expr) -> Option<&[Ident]> {
    match expr {
        Expr::Identifier(ident) => Some(std::slice::from_ref(ident)),
        Expr::CompoundIdentifier(idents) => Some(idents.as_slice()),
        Expr::Nested(expr) => column_idents(expr),
        _ => None,
    }
}

fn key_side(idents: &[Ident], left: &Scope, right: &Scope) -> Result<(Side, Column)> {
    if let [table, _] = idents {
        return match right.has_table(&table.value) {
            true => Ok((Side::Right, right.resolve(idents)?)),
            false => Ok((Side::Left, left.resolve(idents)?)),
        };
    }

    match (left.resolve(idents), right.resolve(idents)) {
        (Ok(column), Err(_)) => Ok((Side::Left, column)),
        (Err(_), Ok(column)) => Ok((Side::Right, column)),
        (Ok(column), Ok(_)) => Err(Error::Reference {
            message: format!("ambiguous column name: {}", column.name()),
            location: location!(),
        }),
        (Err(e), Err(_)) => Err(e),
    }
}
