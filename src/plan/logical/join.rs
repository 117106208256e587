use std::{fmt::Display, sync::Arc};

use arrow::datatypes::{FieldRef, Schema, SchemaRef};
use itertools::Itertools;
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::{coercion::Signature, logical::column::Column, operator::Operator},
};

use super::plan::LogicalPlan;

/// The kind of equi-join to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Only rows with a match on both sides.
    Inner,
    /// Every left row; unmatched ones are padded with nulls.
    Left,
}

impl JoinType {
    /// Renders the join type as a builder argument.
    pub fn to_pipeline(&self) -> &'static str {
        match self {
            JoinType::Inner => "JoinType::Inner",
            JoinType::Left => "JoinType::Left",
        }
    }
}

impl Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
        }
    }
}

/// An equi-join of two logical plans.
#[derive(Debug, Clone)]
pub struct Join {
    /// Left input [`LogicalPlan`].
    lhs: Arc<LogicalPlan>,
    /// Right input [`LogicalPlan`].
    rhs: Arc<LogicalPlan>,
    /// Equijoin keys, as pairs of left and right columns.
    on: Vec<(Column, Column)>,
    /// The type of join.
    join_type: JoinType,
    /// The output schema.
    schema: SchemaRef,
}

impl Join {
    /// Attempts to create a new [`Join`] instance.
    ///
    /// Each key pair must resolve on its own side and the two
    /// key types must be comparable.
    pub fn try_new(
        lhs: Arc<LogicalPlan>,
        rhs: Arc<LogicalPlan>,
        on: Vec<(Column, Column)>,
        join_type: JoinType,
    ) -> Result<Self> {
        if on.is_empty() {
            return Err(Error::InvalidOperation {
                message: "Cannot create a join without join keys".to_string(),
                location: location!(),
            });
        }

        let left_schema = lhs.schema();
        let right_schema = rhs.schema();
        for (left, right) in on.iter() {
            let left_type = left.to_field(&left_schema)?.data_type().clone();
            let right_type = right.to_field(&right_schema)?.data_type().clone();
            Signature::get_input_types(&left_type, &Operator::Eq, &right_type)?;
        }

        let schema = Self::create_join_schema(left_schema, right_schema, &join_type);

        Ok(Self {
            lhs,
            rhs,
            on,
            join_type,
            schema,
        })
    }

    /// The left input.
    pub fn lhs(&self) -> &LogicalPlan {
        &self.lhs
    }

    /// The right input.
    pub fn rhs(&self) -> &LogicalPlan {
        &self.rhs
    }

    /// The join key pairs.
    pub fn on(&self) -> &[(Column, Column)] {
        &self.on
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// The output schema.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Retrieves the child logical plans.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.lhs, &self.rhs]
    }

    /// Creates the output schema for a join operation.
    /// The fields from the left-hand-side are created first.
    fn create_join_schema(
        left_schema: SchemaRef,
        right_schema: SchemaRef,
        join_type: &JoinType,
    ) -> SchemaRef {
        let fields: Vec<FieldRef> = match join_type {
            JoinType::Inner => left_schema
                .fields()
                .iter()
                .chain(right_schema.fields().iter())
                .cloned()
                .collect(),
            JoinType::Left => {
                let nullable_right_fields = right_schema
                    .fields()
                    .iter()
                    .map(|f| Arc::new(f.as_ref().clone().with_nullable(true)))
                    .collect::<Vec<_>>();
                left_schema
                    .fields()
                    .iter()
                    .cloned()
                    .chain(nullable_right_fields)
                    .collect()
            }
        };

        Arc::new(Schema::new(fields))
    }
}

impl Display for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let on = self
            .on
            .iter()
            .map(|(l, r)| format!("{} = {}", l, r))
            .join(", ");
        write!(f, "Join: [type: {}, on: [{}]]", self.join_type, on)
    }
}
