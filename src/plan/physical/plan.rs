use std::{
    any::Any,
    fmt::{Debug, Display},
};

use arrow::{array::RecordBatch, datatypes::SchemaRef};

use crate::error::Result;

/// A trait to represent an [`ExecutionPlan`] for query execution.
///
/// Every operator materializes its whole output as a single [`RecordBatch`].
pub trait ExecutionPlan: Display + Debug {
    /// Returns a reference to self as a `dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// A reference-counted [`arrow::datatypes::Schema`].
    fn schema(&self) -> SchemaRef;

    /// Retrieves the child execution plans.
    fn children(&self) -> Vec<&dyn ExecutionPlan>;

    /// Executes the [`ExecutionPlan`] and returns the resulting `RecordBatch`.
    fn execute(&self) -> Result<RecordBatch>;

    /// A one-line description of this operator.
    fn format(&self) -> String;
}

/// Writes the operator tree rooted at `input`, one operator per line,
/// indenting children with tabs.
pub fn format_exec(
    input: &dyn ExecutionPlan,
    f: &mut std::fmt::Formatter<'_>,
    indent: usize,
) -> std::fmt::Result {
    for _ in 0..indent {
        write!(f, "\t")?;
    }
    write!(f, "{}", input.format())?;
    writeln!(f)?;

    for child in input.children() {
        format_exec(child, f, indent + 1)?;
    }

    Ok(())
}
