//! Translation of a small SQL subset into dataframe plans.
//!
//! Supported: one `SELECT` over a base table with `INNER`/`LEFT` equi-joins,
//! `WHERE`, `GROUP BY`, the aggregates `COUNT`, `SUM`, `AVG`, `MIN` and
//! `MAX`, `HAVING`, `ORDER BY`, `LIMIT`, `OFFSET` and column aliases.
//! Everything else fails with [`Error::Unsupported`].

use snafu::location;
use sqlparser::ast::Statement;
use tracing::debug;

use crate::{
    error::{Error, Result},
    execution::context::SessionContext,
    plan::logical::plan::LogicalPlan,
};

pub mod expr;
pub mod join;
pub mod parser;
pub mod select;
pub mod visitor;

/// Plans `sql` against the tables registered in `ctx`.
pub fn sql_to_plan(ctx: &SessionContext, sql: &str) -> Result<LogicalPlan> {
    debug!(%sql, "translating sql");
    let statement = parser::parse_sql(sql)?;
    visitor::reject_window_functions(&statement)?;

    match statement {
        Statement::Query(query) => select::query_to_plan(ctx, *query),
        other => {
            let keyword = other
                .to_string()
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase();
            Err(Error::Unsupported {
                construct: format!("{keyword} statement"),
                location: location!(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Int64Array, RecordBatch, StringArray},
        datatypes::{DataType, Field, Schema},
        util::pretty,
    };

    use crate::{
        error::Error,
        execution::context::SessionContext,
        model::{country::CountryCode, transit::TransitRecord},
        tests::transit_records,
    };

    const REPORT_SQL: &str = "SELECT country AS country_code, country_name_en AS country_name, COUNT(city) AS num_lines
FROM transit_cost
INNER JOIN country_codes ON country = iso2c
GROUP BY country, country_name_en
HAVING num_lines >= 10
ORDER BY num_lines DESC
LIMIT 15";

    fn context() -> SessionContext {
        let mut records = transit_records(&[("DK", 10), ("TR", 12), ("GB", 3)]);
        records.push(TransitRecord::without_city("TR"));
        let codes = vec![
            CountryCode::new("DK", "Denmark"),
            CountryCode::new("GB", "United Kingdom"),
            CountryCode::new("TR", "Turkey"),
        ];

        let mut ctx = SessionContext::new();
        ctx.register("transit_cost", TransitRecord::to_record_batch(&records).unwrap());
        ctx.register("country_codes", CountryCode::to_record_batch(&codes).unwrap());
        ctx
    }

    fn assert_sql_results(ctx: &SessionContext, sql: &str, expected: Vec<&str>) {
        let results = ctx.sql(sql).unwrap().collect().unwrap();
        let results = pretty::pretty_format_batches(&[results])
            .unwrap()
            .to_string();
        let results = results.trim().lines().collect::<Vec<_>>();
        assert_eq!(results, expected);
    }

    fn assert_unsupported(ctx: &SessionContext, sql: &str, expected: &str) {
        match ctx.sql_to_pipeline(sql) {
            Err(Error::Unsupported { construct, .. }) => assert_eq!(construct, expected, "{sql}"),
            other => panic!("expected unsupported '{expected}' for {sql}, got {other:?}"),
        }
    }

    #[test]
    fn test_sql_to_pipeline_report_query() {
        let ctx = context();
        let expected = [
            r#"ctx.table("transit_cost")?"#,
            r#"    .join(ctx.table("country_codes")?, JoinType::Inner, &["country"], &["iso2c"])?"#,
            r#"    .aggregate(vec![col("country"), col("country_name_en")], vec![count(col("city")).alias("num_lines")])?"#,
            r#"    .filter(col("num_lines").gt_eq(lit(10)))?"#,
            r#"    .order_by(vec![col("num_lines").sort(false)])?"#,
            r#"    .limit(0, Some(15))"#,
            r#"    .select(vec![col("country").alias("country_code"), col("country_name_en").alias("country_name"), col("num_lines")])?"#,
        ]
        .join("\n");

        assert_eq!(ctx.sql_to_pipeline(REPORT_SQL).unwrap(), expected);
    }

    #[test]
    fn test_sql_report_query_results() {
        let ctx = context();
        let expected = vec![
            "+--------------+--------------+-----------+",
            "| country_code | country_name | num_lines |",
            "+--------------+--------------+-----------+",
            "| TR           | Turkey       | 12        |",
            "| DK           | Denmark      | 10        |",
            "+--------------+--------------+-----------+",
        ];
        assert_sql_results(&ctx, REPORT_SQL, expected);
    }

    #[test]
    fn test_sql_simple_queries() {
        let ctx = context();

        let sql = "SELECT t.city, t.country FROM transit_cost AS t WHERE t.country = 'GB' ORDER BY city DESC LIMIT 2 OFFSET 1";
        let expected = vec![
            "+-----------+---------+",
            "| city      | country |",
            "+-----------+---------+",
            "| GB city 1 | GB      |",
            "| GB city 0 | GB      |",
            "+-----------+---------+",
        ];
        assert_sql_results(&ctx, sql, expected);

        let sql = "SELECT COUNT(*) AS n, COUNT(city) FROM transit_cost WHERE country = 'TR'";
        let expected = vec![
            "+----+-------------+",
            "| n  | COUNT(city) |",
            "+----+-------------+",
            "| 13 | 12          |",
            "+----+-------------+",
        ];
        assert_sql_results(&ctx, sql, expected);
    }

    #[test]
    fn test_sql_left_join_and_positional_order() {
        let ctx = context();
        let sql = "SELECT c.iso2c, COUNT(t.city) AS lines
FROM country_codes c LEFT JOIN transit_cost t ON t.country = c.iso2c
GROUP BY c.iso2c
ORDER BY 2";
        let expected = vec![
            "+-------+-------+",
            "| iso2c | lines |",
            "+-------+-------+",
            "| GB    | 3     |",
            "| DK    | 10    |",
            "| TR    | 12    |",
            "+-------+-------+",
        ];
        assert_sql_results(&ctx, sql, expected);

        let pipeline = ctx.sql_to_pipeline(sql).unwrap();
        assert!(pipeline.contains(
            r#".join(ctx.table("transit_cost")?, JoinType::Left, &["iso2c"], &["country"])?"#
        ));
    }

    #[test]
    fn test_sql_aggregate_expressions() {
        let mut ctx = SessionContext::new();
        let schema = Arc::new(Schema::new(vec![
            Field::new("k", DataType::Utf8, true),
            Field::new("v", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["a", "b", "a", "b", "c"])),
                Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            ],
        )
        .unwrap();
        ctx.register("t", batch);

        let sql = "SELECT k, SUM(v) / COUNT(v) AS mean FROM t GROUP BY k HAVING SUM(v) > 4 ORDER BY k";
        let pipeline = ctx.sql_to_pipeline(sql).unwrap();
        let expected = [
            r#"ctx.table("t")?"#,
            r#"    .aggregate(vec![col("k")], vec![sum(col("v")), count(col("v"))])?"#,
            r#"    .filter(col("SUM(v)").gt(lit(4)))?"#,
            r#"    .order_by(vec![col("k").sort(true)])?"#,
            r#"    .select(vec![col("k"), col("SUM(v)").divide(col("COUNT(v)")).alias("mean")])?"#,
        ]
        .join("\n");
        assert_eq!(pipeline, expected);

        let expected = vec![
            "+---+------+",
            "| k | mean |",
            "+---+------+",
            "| b | 3    |",
            "| c | 5    |",
            "+---+------+",
        ];
        assert_sql_results(&ctx, sql, expected);

        let result = ctx.sql("SELECT k, v FROM t GROUP BY k");
        assert!(matches!(result, Err(Error::InvalidOperation { .. })));
    }

    #[test]
    fn test_sql_reference_errors() {
        let ctx = context();

        let result = ctx.sql_to_pipeline("SELECT city FROM missing");
        assert!(matches!(result, Err(Error::Reference { .. })));

        let result = ctx.sql_to_pipeline("SELECT town FROM transit_cost");
        assert!(matches!(result, Err(Error::Reference { .. })));

        let result = ctx.sql_to_pipeline(
            "SELECT currency FROM transit_cost JOIN country_codes ON country = iso2c",
        );
        assert!(matches!(result, Err(Error::Reference { .. })));
    }

    #[test]
    fn test_sql_unsupported_constructs() {
        let ctx = context();

        let cases = [
            (
                "SELECT country, COUNT(*) OVER (PARTITION BY country) FROM transit_cost",
                "window function",
            ),
            ("SELECT DISTINCT country FROM transit_cost", "SELECT DISTINCT"),
            (
                "WITH t AS (SELECT * FROM transit_cost) SELECT * FROM t",
                "WITH clause",
            ),
            (
                "SELECT city FROM transit_cost UNION SELECT iso2c FROM country_codes",
                "UNION set operation",
            ),
            ("SELECT UPPER(city) FROM transit_cost", "function UPPER"),
            (
                "SELECT city FROM transit_cost ORDER BY city NULLS LAST",
                "NULLS FIRST/LAST",
            ),
            ("SELECT city FROM transit_cost LIMIT 1 + 1", "non-literal LIMIT"),
            (
                "SELECT * FROM (SELECT city FROM transit_cost) AS sub",
                "subquery in FROM",
            ),
            ("DELETE FROM transit_cost", "DELETE statement"),
        ];

        for (sql, construct) in cases {
            assert_unsupported(&ctx, sql, construct);
        }

        let result = ctx.sql_to_pipeline(
            "SELECT city FROM transit_cost JOIN country_codes ON country < iso2c",
        );
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }
}
