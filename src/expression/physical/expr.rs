use std::{
    any::Any,
    fmt::{Debug, Display},
};

use arrow::{
    array::RecordBatch,
    datatypes::{DataType, Schema},
};

use crate::{error::Result, expression::values::ColumnarValue};

/// An expression bound to column positions, evaluated against record batches.
pub trait PhysicalExpression: Display + Debug {
    /// Returns the expression as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// The [`DataType`] the expression evaluates to.
    fn data_type(&self, schema: &Schema) -> Result<DataType>;

    /// Evaluates the expression against `input`.
    fn eval(&self, input: &RecordBatch) -> Result<ColumnarValue>;
}
