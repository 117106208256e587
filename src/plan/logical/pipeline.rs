use itertools::Itertools;

use crate::expression::logical::expr::Expression;

use super::plan::LogicalPlan;

impl LogicalPlan {
    /// Renders the plan as the chain of builder calls that produces it,
    /// one method per line.
    pub fn to_pipeline(&self) -> String {
        let (base, methods) = self.pipeline_parts();
        methods
            .iter()
            .fold(base, |acc, method| format!("{acc}\n    {method}"))
    }

    /// Renders the plan on a single line, for nesting inside a join.
    fn to_inline_pipeline(&self) -> String {
        let (base, methods) = self.pipeline_parts();
        methods.iter().fold(base, |acc, method| acc + method)
    }

    fn pipeline_parts(&self) -> (String, Vec<String>) {
        let (base, mut methods) = match self.children().first() {
            Some(input) => input.pipeline_parts(),
            None => (String::new(), vec![]),
        };

        match self {
            LogicalPlan::Scan(scan) => return (format!("ctx.table({:?})?", scan.name()), vec![]),
            LogicalPlan::Projection(projection) => {
                methods.push(format!(".select({})?", render_list(projection.expressions())))
            }
            LogicalPlan::Filter(filter) => {
                methods.push(format!(".filter({})?", filter.predicate().to_pipeline()))
            }
            LogicalPlan::Aggregate(aggregate) => methods.push(format!(
                ".aggregate({}, {})?",
                render_list(aggregate.group_by()),
                render_list(aggregate.aggregate_expressions())
            )),
            LogicalPlan::Sort(sort) => {
                methods.push(format!(".order_by({})?", render_list(sort.expressions())))
            }
            LogicalPlan::Limit(limit) => methods.push(limit.pipeline_step()),
            LogicalPlan::Join(join) => {
                let (left_keys, right_keys): (Vec<_>, Vec<_>) = join
                    .on()
                    .iter()
                    .map(|(l, r)| (format!("{:?}", l.name()), format!("{:?}", r.name())))
                    .unzip();
                methods.push(format!(
                    ".join({}, {}, &[{}], &[{}])?",
                    join.rhs().to_inline_pipeline(),
                    join.join_type().to_pipeline(),
                    left_keys.join(", "),
                    right_keys.join(", ")
                ))
            }
        }

        (base, methods)
    }
}

fn render_list(expressions: &[Expression]) -> String {
    format!(
        "vec![{}]",
        expressions.iter().map(|e| e.to_pipeline()).join(", ")
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        expression::logical::{
            column::Column,
            expr_fn::{col, count, lit},
        },
        io::memory::MemTable,
        plan::logical::{
            filter::Filter,
            join::{Join, JoinType},
            limit::Limit,
            plan::LogicalPlan,
            scan::Scan,
        },
        tests::create_record_batch,
    };

    fn scan(name: &str) -> Arc<LogicalPlan> {
        let source = Arc::new(MemTable::new(create_record_batch()));
        Arc::new(LogicalPlan::Scan(Scan::new(name, source)))
    }

    #[test]
    fn test_scan_pipeline() {
        assert_eq!(scan("simple").to_pipeline(), r#"ctx.table("simple")?"#);
    }

    #[test]
    fn test_nested_join_pipeline() {
        let rhs = Filter::try_new(scan("right"), col("c2").gt(lit(1))).unwrap();
        let join = Join::try_new(
            scan("left"),
            Arc::new(LogicalPlan::Filter(rhs)),
            vec![(Column::new("c1"), Column::new("c1"))],
            JoinType::Left,
        )
        .unwrap();
        let limit = LogicalPlan::Limit(Limit::new(Arc::new(LogicalPlan::Join(join)), 2, None));

        let expected = [
            r#"ctx.table("left")?"#,
            r#"    .join(ctx.table("right")?.filter(col("c2").gt(lit(1)))?, JoinType::Left, &["c1"], &["c1"])?"#,
            r#"    .limit(2, None)"#,
        ]
        .join("\n");
        assert_eq!(limit.to_pipeline(), expected);
        // aggregates render their builder names
        assert_eq!(count(col("c1")).to_pipeline(), r#"count(col("c1"))"#);
    }
}
