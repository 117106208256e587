use std::fmt::Display;

use arrow::datatypes::SchemaRef;

use super::{
    aggregate::Aggregate, filter::Filter, join::Join, limit::Limit, projection::Projection,
    scan::Scan, sort::Sort,
};

/// Represents a [`LogicalPlan`] for query execution.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// A [`Scan`] operation on the [`DataSource`].
    ///
    /// [`DataSource`]: crate::io::DataSource
    Scan(Scan),
    Projection(Projection),
    Filter(Filter),
    Aggregate(Aggregate),
    Sort(Sort),
    Limit(Limit),
    Join(Join),
}

impl LogicalPlan {
    /// A reference-counted [`arrow::datatypes::Schema`].
    pub fn schema(&self) -> SchemaRef {
        match self {
            LogicalPlan::Scan(plan) => plan.schema(),
            LogicalPlan::Projection(plan) => plan.schema(),
            LogicalPlan::Filter(plan) => plan.schema(),
            LogicalPlan::Aggregate(plan) => plan.schema(),
            LogicalPlan::Sort(plan) => plan.schema(),
            LogicalPlan::Limit(plan) => plan.schema(),
            LogicalPlan::Join(plan) => plan.schema(),
        }
    }

    /// Retrieves the child logical plans.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan(plan) => plan.children(),
            LogicalPlan::Projection(plan) => plan.children(),
            LogicalPlan::Filter(plan) => plan.children(),
            LogicalPlan::Aggregate(plan) => plan.children(),
            LogicalPlan::Sort(plan) => plan.children(),
            LogicalPlan::Limit(plan) => plan.children(),
            LogicalPlan::Join(plan) => plan.children(),
        }
    }

    /// Formats the logical plan for display purposes with indentation.
    fn format(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        for _ in 0..indent {
            write!(f, "\t")?;
        }

        match self {
            LogicalPlan::Scan(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Projection(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Filter(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Aggregate(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Sort(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Limit(plan) => write!(f, "{}", plan)?,
            LogicalPlan::Join(plan) => write!(f, "{}", plan)?,
        }
        writeln!(f)?;

        for child in self.children() {
            child.format(f, indent + 1)?;
        }

        Ok(())
    }
}

impl Display for LogicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        expression::logical::expr_fn::{col, count, lit},
        io::memory::MemTable,
        plan::logical::{
            aggregate::Aggregate, filter::Filter, projection::Projection, scan::Scan,
        },
        tests::create_record_batch,
    };

    use super::LogicalPlan;

    fn scan() -> LogicalPlan {
        let source = Arc::new(MemTable::new(create_record_batch()));
        LogicalPlan::Scan(Scan::new("simple", source))
    }

    #[test]
    fn test_logical_plan_scan() {
        let scan = scan();

        assert!(scan.children().is_empty());
        assert_eq!(scan.schema().fields().len(), 3);
    }

    #[test]
    fn test_logical_plan_display() {
        let filter = Filter::try_new(Arc::new(scan()), col("c2").gt(lit(1))).unwrap();
        let aggregate = Aggregate::try_new(
            Arc::new(LogicalPlan::Filter(filter)),
            vec![col("c1")],
            vec![count(col("c3")).alias("n")],
        )
        .unwrap();
        let projection = Projection::try_new(
            Arc::new(LogicalPlan::Aggregate(aggregate)),
            vec![col("n"), col("c1").alias("name")],
        )
        .unwrap();
        let plan = LogicalPlan::Projection(projection);

        assert_eq!(
            plan.to_string(),
            "Projection: [n, c1 AS name]\n\t\
                Aggregate: groupBy:[c1]; aggrExprs:[COUNT(c3) AS n]\n\t\t\
                    Filter: [c2 > 1]\n\t\t\t\
                        Scan: simple\n"
        );
        assert_eq!(plan.schema().field(1).name(), "name");
    }
}
