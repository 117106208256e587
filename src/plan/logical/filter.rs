use std::{fmt::Display, sync::Arc};

use arrow::datatypes::{DataType, SchemaRef};
use snafu::location;

use crate::{
    error::{Error, Result},
    expression::logical::expr::Expression,
};

use super::plan::LogicalPlan;

/// Represents a filter operation in a logical plan.
#[derive(Debug, Clone)]
pub struct Filter {
    /// The input [`LogicalPlan`].
    input: Arc<LogicalPlan>,
    /// The filter predicate to apply.
    predicate: Expression,
}

impl Filter {
    /// Attempts to create a new [`Filter`] instance.
    pub fn try_new(input: Arc<LogicalPlan>, predicate: Expression) -> Result<Self> {
        predicate.ensure_no_aggregate("a filter")?;
        if predicate.data_type(&input.schema())? != DataType::Boolean {
            return Err(Error::InvalidData {
                message: format!(
                    "Cannot create filter with non-boolean predicate '{}'",
                    predicate
                ),
                location: location!(),
            });
        };

        Ok(Self { input, predicate })
    }

    /// Retrieves the input [`LogicalPlan`].
    pub fn input(&self) -> &LogicalPlan {
        &self.input
    }

    /// Retrieves the filter predicate applied to [`Filter`].
    pub fn predicate(&self) -> &Expression {
        &self.predicate
    }

    /// A reference-counted [`arrow::datatypes::Schema`] of the input plan.
    pub fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    /// Retrieves the child logical plans.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter: [{}]", self.predicate)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        error::Error,
        expression::logical::expr_fn::{col, count, lit},
        io::memory::MemTable,
        plan::logical::{plan::LogicalPlan, scan::Scan},
        tests::create_record_batch,
    };

    use super::Filter;

    #[test]
    fn test_filter_requires_boolean_predicate() {
        let source = Arc::new(MemTable::new(create_record_batch()));
        let scan = Arc::new(LogicalPlan::Scan(Scan::new("simple", source)));

        let result = Filter::try_new(scan.clone(), col("c2").plus(lit(1)));
        assert!(matches!(result, Err(Error::InvalidData { .. })));

        let result = Filter::try_new(scan.clone(), count(col("c1")).gt(lit(1)));
        assert!(matches!(result, Err(Error::InvalidOperation { .. })));

        assert!(Filter::try_new(scan, col("c1").is_null()).is_ok());
    }
}
