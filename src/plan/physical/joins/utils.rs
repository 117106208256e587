use std::sync::Arc;

use arrow::{
    array::{ArrayRef, RecordBatch, UInt32Array},
    compute::take,
    datatypes::{Schema, SchemaRef},
};

use crate::{
    error::Result, expression::physical::column::ColumnExpr, plan::logical::join::JoinType,
};

/// Pairs of left and right key columns an equi-join matches on.
pub type JoinOn = Vec<(ColumnExpr, ColumnExpr)>;

/// Enum representing which side of a join a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    /// The left side of the join.
    Left,
    /// The right side of the join.
    Right,
}

/// Represents an index of a column involved in a join operation,
/// along with the side (left or right) from which the column originates.
#[derive(Debug, Clone, Copy)]
pub struct JoinColumnIndex {
    /// The column's index.
    index: usize,
    /// The side of the join from which the
    /// column originates.
    side: JoinSide,
}

impl JoinColumnIndex {
    /// Creates a new [`JoinColumnIndex`] instance.
    pub fn new(index: usize, side: JoinSide) -> Self {
        Self { index, side }
    }

    /// Returns the index of the column within the schema.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the side of the join to which the column belongs.
    pub fn side(&self) -> JoinSide {
        self.side
    }
}

/// Creates a schema for a join operation, starting with the left sides fields.
///
/// Right fields become nullable for a left join.
pub fn create_join_schema(
    left_schema: &Schema,
    right_schema: &Schema,
    join_type: &JoinType,
) -> (SchemaRef, Vec<JoinColumnIndex>) {
    let left_fields = left_schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            (
                field.as_ref().clone(),
                JoinColumnIndex::new(index, JoinSide::Left),
            )
        });
    let right_fields = right_schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let nullable = field.is_nullable() || *join_type == JoinType::Left;
            (
                field.as_ref().clone().with_nullable(nullable),
                JoinColumnIndex::new(index, JoinSide::Right),
            )
        });

    let (fields, column_indices): (Vec<_>, Vec<_>) = left_fields.chain(right_fields).unzip();
    (Arc::new(Schema::new(fields)), column_indices)
}

/// Assembles the joined batch by taking the left and right rows at the
/// given positions. A null right index yields a null-padded row.
pub fn build_batch_from_indices(
    schema: SchemaRef,
    left: &RecordBatch,
    right: &RecordBatch,
    left_indices: &UInt32Array,
    right_indices: &UInt32Array,
    column_indices: &[JoinColumnIndex],
) -> Result<RecordBatch> {
    let columns = column_indices
        .iter()
        .map(|column| -> Result<ArrayRef> {
            let array = match column.side() {
                JoinSide::Left => take(left.column(column.index()).as_ref(), left_indices, None)?,
                JoinSide::Right => {
                    take(right.column(column.index()).as_ref(), right_indices, None)?
                }
            };
            Ok(array)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(schema, columns)?)
}

#[cfg(test)]
mod tests {
    use crate::{plan::logical::join::JoinType, tests::create_schema};

    use super::{create_join_schema, JoinSide};

    #[test]
    fn test_create_join_schema() {
        let left_schema = create_schema();
        let right_schema = create_schema();

        let (schema, column_indices) =
            create_join_schema(&left_schema, &right_schema, &JoinType::Inner);
        assert_eq!(schema.fields().len(), 6);
        assert_eq!(column_indices.len(), 6);
        assert_eq!(column_indices[3].side(), JoinSide::Right);
        assert_eq!(column_indices[3].index(), 0);
    }
}
