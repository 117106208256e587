use std::{any::Any, fmt::Display};

use arrow::{
    array::RecordBatch,
    datatypes::{DataType, Schema},
};
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::values::ColumnarValue,
};

use super::expr::PhysicalExpression;

/// Represents a physical [`Column`]
/// expression in an [`ExecutionPlan`]
///
/// [`Column`]: crate::expression::logical::column::Column
/// [`ExecutionPlan`]: crate::plan::physical::plan::ExecutionPlan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    /// The column name.
    name: String,
    /// The column index.
    index: usize,
}

impl ColumnExpr {
    /// Creates a new [`ColumnExpr`] instance.
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column index.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PhysicalExpression for ColumnExpr {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn data_type(&self, schema: &Schema) -> Result<DataType> {
        if self.index >= schema.fields().len() {
            return Err(Error::InvalidData {
                message: format!(
                    "Referenced column '{}' cannot be found in schema. Index out of bound.",
                    self.name
                ),
                location: location!(),
            });
        };

        Ok(schema.field(self.index).data_type().clone())
    }

    fn eval(&self, input: &RecordBatch) -> Result<ColumnarValue> {
        if self.index >= input.num_columns() {
            return Err(Error::InvalidData {
                message: format!(
                    "Referenced column '{}' cannot be found in batch. Index out of bound.",
                    self.name
                ),
                location: location!(),
            });
        }

        Ok(ColumnarValue::Array(input.column(self.index).clone()))
    }
}

impl Display for ColumnExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.index)
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::DataType;

    use crate::{
        expression::physical::expr::PhysicalExpression,
        tests::{create_record_batch, create_schema},
    };

    use super::ColumnExpr;

    #[test]
    fn test_column_expr_eval() {
        let batch = create_record_batch();
        let expr = ColumnExpr::new("c2", 1);

        let result = expr.eval(&batch).unwrap().into_array(2).unwrap();
        assert_eq!(&result, batch.column(1));
        assert_eq!(expr.to_string(), "c2@1");
    }

    #[test]
    fn test_column_expr_data_type() {
        let schema = create_schema();

        assert_eq!(ColumnExpr::new("c1", 0).data_type(&schema).unwrap(), DataType::Utf8);
        assert!(ColumnExpr::new("c9", 9).data_type(&schema).is_err());
    }
}
