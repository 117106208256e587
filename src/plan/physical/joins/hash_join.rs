use std::{
    any::Any,
    collections::HashMap,
    fmt::{Debug, Display},
    sync::Arc,
};

use ahash::RandomState;
use arrow::{
    array::{Array, ArrayRef, RecordBatch, UInt32Array},
    compute::cast,
    datatypes::{DataType, Schema, SchemaRef},
    row::{OwnedRow, RowConverter, Rows, SortField},
};
use itertools::Itertools;
use snafu::location;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    expression::{coercion::Signature, operator::Operator, physical::expr::PhysicalExpression},
    plan::{
        logical::join::JoinType,
        physical::plan::{format_exec, ExecutionPlan},
    },
};

use super::utils::{build_batch_from_indices, create_join_schema, JoinColumnIndex, JoinOn};

/// Equi-join that builds a hash table over the right input and
/// probes it with the left input.
///
/// Output rows follow left input order, and matches for one left row
/// follow right input order. Null keys never match.
#[derive(Debug)]
pub struct HashJoinExec {
    lhs: Arc<dyn ExecutionPlan>,
    rhs: Arc<dyn ExecutionPlan>,
    on: JoinOn,
    join_type: JoinType,
    /// The type both sides of each key pair are cast to before comparing.
    key_types: Vec<DataType>,
    /// The output schema, after the join operation.
    schema: SchemaRef,
    column_indices: Vec<JoinColumnIndex>,
}

impl HashJoinExec {
    pub fn try_new(
        lhs: Arc<dyn ExecutionPlan>,
        rhs: Arc<dyn ExecutionPlan>,
        on: JoinOn,
        join_type: JoinType,
    ) -> Result<Self> {
        if on.is_empty() {
            return Err(Error::InvalidData {
                message: "The 'JoinOn' constraints should not be empty".to_string(),
                location: location!(),
            });
        }

        let left_schema = lhs.schema();
        let right_schema = rhs.schema();
        let key_types = Self::coerce_keys(&left_schema, &right_schema, &on)?;
        let (schema, column_indices) = create_join_schema(&left_schema, &right_schema, &join_type);

        Ok(Self {
            lhs,
            rhs,
            on,
            join_type,
            key_types,
            schema,
            column_indices,
        })
    }

    /// Checks every key column against its side's schema and
    /// resolves the common type of each key pair.
    fn coerce_keys(
        left_schema: &Schema,
        right_schema: &Schema,
        on: &JoinOn,
    ) -> Result<Vec<DataType>> {
        on.iter()
            .map(|(left, right)| -> Result<DataType> {
                let left_type = left.data_type(left_schema)?;
                let right_type = right.data_type(right_schema)?;
                if left_schema.field(left.index()).name() != left.name()
                    || right_schema.field(right.index()).name() != right.name()
                {
                    return Err(Error::InvalidData {
                        message: format!(
                            "Join key {} = {} does not match the input schemas",
                            left, right
                        ),
                        location: location!(),
                    });
                }
                let (key_type, _) =
                    Signature::get_input_types(&left_type, &Operator::Eq, &right_type)?;
                Ok(key_type)
            })
            .collect()
    }

    /// Evaluates one side's key columns, cast to the common key types.
    fn evaluate_keys(
        &self,
        batch: &RecordBatch,
        keys: impl Iterator<Item = Arc<dyn PhysicalExpression>>,
    ) -> Result<Vec<ArrayRef>> {
        keys.zip(self.key_types.iter())
            .map(|(expr, key_type)| -> Result<ArrayRef> {
                let values = expr.eval(batch)?.into_array(batch.num_rows())?;
                Ok(cast(&values, key_type)?)
            })
            .collect()
    }

    /// Maps every non-null right key to the right rows holding it, in input order.
    fn build_side(
        rows: &Rows,
        keys: &[ArrayRef],
    ) -> HashMap<OwnedRow, Vec<u32>, RandomState> {
        let mut map: HashMap<OwnedRow, Vec<u32>, RandomState> = HashMap::default();
        for (idx, row) in rows.iter().enumerate() {
            if has_null_key(keys, idx) {
                continue;
            }
            map.entry(row.owned()).or_default().push(idx as u32);
        }
        map
    }
}

/// Whether any key column is null at `idx`.
fn has_null_key(keys: &[ArrayRef], idx: usize) -> bool {
    keys.iter().any(|key| key.is_null(idx))
}

impl ExecutionPlan for HashJoinExec {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn children(&self) -> Vec<&dyn ExecutionPlan> {
        vec![self.lhs.as_ref(), self.rhs.as_ref()]
    }

    fn execute(&self) -> Result<RecordBatch> {
        let left = self.lhs.execute()?;
        let right = self.rhs.execute()?;

        let left_keys = self.evaluate_keys(
            &left,
            self.on
                .iter()
                .map(|(l, _)| Arc::new(l.clone()) as Arc<dyn PhysicalExpression>),
        )?;
        let right_keys = self.evaluate_keys(
            &right,
            self.on
                .iter()
                .map(|(_, r)| Arc::new(r.clone()) as Arc<dyn PhysicalExpression>),
        )?;

        let converter = RowConverter::new(
            self.key_types
                .iter()
                .map(|key_type| SortField::new(key_type.clone()))
                .collect(),
        )?;
        let right_rows = converter.convert_columns(&right_keys)?;
        let map = Self::build_side(&right_rows, &right_keys);
        debug!(
            build_rows = right.num_rows(),
            distinct_keys = map.len(),
            "built join hash table"
        );

        let left_rows = converter.convert_columns(&left_keys)?;
        let mut left_indices = Vec::with_capacity(left.num_rows());
        let mut right_indices: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
        let mut unmatched = 0usize;
        for (idx, row) in left_rows.iter().enumerate() {
            let matches = if has_null_key(&left_keys, idx) {
                None
            } else {
                map.get(&row.owned())
            };
            match (matches, self.join_type) {
                (Some(matches), _) => {
                    for right_idx in matches {
                        left_indices.push(idx as u32);
                        right_indices.push(Some(*right_idx));
                    }
                }
                (None, JoinType::Left) => {
                    left_indices.push(idx as u32);
                    right_indices.push(None);
                }
                (None, JoinType::Inner) => unmatched += 1,
            }
        }

        if unmatched > 0 {
            warn!(
                dropped = unmatched,
                on = %self.on.iter().map(|(l, r)| format!("{} = {}", l, r)).join(", "),
                "left rows without a join partner were dropped"
            );
        }

        build_batch_from_indices(
            self.schema.clone(),
            &left,
            &right,
            &UInt32Array::from(left_indices),
            &UInt32Array::from(right_indices),
            &self.column_indices,
        )
    }

    fn format(&self) -> String {
        format!(
            "HashJoinExec: [type: {}, on: [{}]]",
            self.join_type,
            self.on
                .iter()
                .map(|(l, r)| format!("{} = {}", l, r))
                .join(", ")
        )
    }
}

impl Display for HashJoinExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}
