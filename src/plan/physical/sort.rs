use std::{any::Any, fmt::Display, sync::Arc};

use arrow::{
    array::{RecordBatch, UInt32Array},
    compute::{take_record_batch, LexicographicalComparator},
    datatypes::SchemaRef,
};
use itertools::Itertools;

use crate::{error::Result, expression::physical::sort::SortExpr};

use super::plan::{format_exec, ExecutionPlan};

/// Orders its input by one or more sort keys.
///
/// The sort is stable: rows comparing equal on every key
/// keep their input order.
#[derive(Debug)]
pub struct SortExec {
    input: Arc<dyn ExecutionPlan>,
    expression: Vec<SortExpr>,
}

impl SortExec {
    pub fn new(input: Arc<dyn ExecutionPlan>, expression: Vec<SortExpr>) -> Self {
        Self { input, expression }
    }

    fn sort_batch(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let sort_columns = self
            .expression
            .iter()
            .map(|expr| expr.evaluate_to_sort_column(batch))
            .collect::<Result<Vec<_>>>()?;
        let comparator = LexicographicalComparator::try_new(&sort_columns)?;

        let mut indices = (0..batch.num_rows() as u32).collect::<Vec<_>>();
        indices.sort_by(|a, b| comparator.compare(*a as usize, *b as usize));

        Ok(take_record_batch(batch, &UInt32Array::from(indices))?)
    }
}

impl ExecutionPlan for SortExec {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    fn children(&self) -> Vec<&dyn ExecutionPlan> {
        vec![self.input.as_ref()]
    }

    fn execute(&self) -> Result<RecordBatch> {
        let input = self.input.execute()?;
        self.sort_batch(&input)
    }

    fn format(&self) -> String {
        format!("SortExec: [{}]", self.expression.iter().join(", "))
    }
}

impl Display for SortExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format_exec(self, f, 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Int64Array, RecordBatch, StringArray},
        datatypes::{DataType, Field, Schema},
    };

    use crate::{
        expression::physical::{column::ColumnExpr, sort::SortExpr},
        io::memory::MemTable,
        plan::physical::{plan::ExecutionPlan, scan::ScanExec},
        tests::create_record_batch_with_nulls,
    };

    use super::SortExec;

    fn sort_on(batch: RecordBatch, keys: Vec<(&str, usize, bool)>) -> RecordBatch {
        let scan = Arc::new(ScanExec::new("t", Arc::new(MemTable::new(batch))));
        let keys = keys
            .into_iter()
            .map(|(name, index, asc)| SortExpr::new(Arc::new(ColumnExpr::new(name, index)), asc))
            .collect();
        SortExec::new(scan, keys).execute().unwrap()
    }

    #[test]
    fn test_sort_is_stable() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("n", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["a", "b", "c", "d", "e"])),
                Arc::new(Int64Array::from(vec![1, 3, 1, 3, 2])),
            ],
        )
        .unwrap();

        let sorted = sort_on(batch, vec![("n", 1, false)]);
        let names = sorted.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(
            names.iter().flatten().collect::<Vec<_>>(),
            vec!["b", "d", "e", "a", "c"]
        );
    }

    #[test]
    fn test_sort_null_placement() {
        // c2 = [1, 2, null]
        let ascending = sort_on(create_record_batch_with_nulls(), vec![("c2", 1, true)]);
        let values = ascending.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(values.iter().collect::<Vec<_>>(), vec![None, Some(1), Some(2)]);

        let descending = sort_on(create_record_batch_with_nulls(), vec![("c2", 1, false)]);
        let values = descending.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(values.iter().collect::<Vec<_>>(), vec![Some(2), Some(1), None]);
    }
}
