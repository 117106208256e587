//! The transit-cost report: the same question asked in SQL against the
//! store and as a dataframe pipeline, with the SQL translated back into
//! pipeline text.

use arrow::{array::RecordBatch, util::pretty};
use tracing::{debug, info, warn};

use crate::{
    config::ReportConfig,
    error::{Error, Result},
    execution::{context::SessionContext, dataframe::DataFrame},
    expression::logical::expr_fn::{avg, col, count, lit},
    io::{
        csv::{read_csv, CsvReadOptions},
        fetch::read_source,
    },
    model::{
        country::{country_codes_schema, CountryCode, COUNTRY_CODES_TABLE},
        transit::{transit_cost_schema, TRANSIT_COST_TABLE},
    },
    normalize::normalize_country_codes,
    plan::logical::join::JoinType,
    store::with_store,
};

/// The relation the SQL result is registered under in the session.
pub const TOP_LINES_TABLE: &str = "top_lines";

/// A query the translator rejects, shown at the end of the report.
pub const WINDOW_SQL: &str =
    "SELECT country, COUNT(*) OVER (PARTITION BY country) AS lines FROM transit_cost";

/// Everything the report produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Relations in the store after persisting.
    pub tables: Vec<String>,
    /// The report computed by the store.
    pub sql_result: RecordBatch,
    /// The average line count over the SQL result.
    pub top_lines_summary: RecordBatch,
    /// The report computed by the dataframe pipeline.
    pub pipeline_result: RecordBatch,
    /// Whether both formulations produced the same batch.
    pub formulations_agree: bool,
    /// The report SQL translated into pipeline text.
    pub translated: String,
    /// Why the window-function query could not be translated.
    pub window_error: Option<String>,
}

/// The report as SQL text.
pub fn report_sql(min_lines: u32, top: usize) -> String {
    format!(
        "SELECT country AS country_code, country_name_en AS country_name, COUNT(city) AS num_lines
FROM {TRANSIT_COST_TABLE}
INNER JOIN {COUNTRY_CODES_TABLE} ON country = iso2c
GROUP BY country, country_name_en
HAVING num_lines >= {min_lines}
ORDER BY num_lines DESC
LIMIT {top}"
    )
}

/// The report as a dataframe pipeline over the tables registered in `ctx`.
pub fn top_lines_pipeline(ctx: &SessionContext, min_lines: u32, top: usize) -> Result<DataFrame> {
    ctx.table(TRANSIT_COST_TABLE)?
        .join(ctx.table(COUNTRY_CODES_TABLE)?, JoinType::Inner, &["country"], &["iso2c"])?
        .aggregate(
            vec![col("country"), col("country_name_en")],
            vec![count(col("city")).alias("num_lines")],
        )?
        .filter(col("num_lines").gt_eq(lit(min_lines)))?
        .order_by(vec![col("num_lines").sort(false)])?
        .limit(0, Some(top))
        .select(vec![
            col("country").alias("country_code"),
            col("country_name_en").alias("country_name"),
            col("num_lines"),
        ])
}

/// A session holding both tables.
pub fn session(transit: &RecordBatch, country_codes: &RecordBatch) -> SessionContext {
    let mut ctx = SessionContext::new();
    ctx.register(TRANSIT_COST_TABLE, transit.clone());
    ctx.register(COUNTRY_CODES_TABLE, country_codes.clone());
    ctx
}

/// A session with empty tables, enough to translate SQL without loading data.
pub fn schema_session() -> SessionContext {
    session(
        &RecordBatch::new_empty(transit_cost_schema()),
        &RecordBatch::new_empty(country_codes_schema()),
    )
}

/// Reads the transit-cost dataset from a local path or URL.
pub fn load_transit_costs(source: &str) -> Result<RecordBatch> {
    let bytes = read_source(source)?;
    read_csv(bytes.as_slice(), transit_cost_schema(), &CsvReadOptions::new())
}

/// Runs the full report and prints every step to stdout.
pub fn run_report(config: &ReportConfig) -> Result<ReportOutcome> {
    info!(source = config.source(), "loading transit costs");
    let transit = load_transit_costs(config.source())?;
    debug!(rows = transit.num_rows(), "loaded transit costs");

    info!("loading country codes");
    let country_codes = CountryCode::bundled()?;
    debug!(rows = country_codes.num_rows(), "loaded country codes");

    info!("normalizing country codes");
    let transit = normalize_country_codes(&transit)?;

    with_store(config.database(), |store| {
        info!("persisting relations");
        store.persist(TRANSIT_COST_TABLE, &transit)?;
        store.persist(COUNTRY_CODES_TABLE, &country_codes)?;
        let tables = store.table_names()?;
        println!(
            "Relations in {}: {}\n",
            config.database().display(),
            tables.join(", ")
        );

        let mut ctx = session(&transit, &country_codes);
        let pipeline = top_lines_pipeline(&ctx, config.min_lines(), config.top())?;

        info!("querying the store");
        let sql = report_sql(config.min_lines(), config.top());
        debug!(%sql, "report query");
        println!("{sql}\n");
        let sql_result = store.query_as(&sql, pipeline.schema())?;
        pretty::print_batches(&[sql_result.clone()])?;

        info!("continuing from the query result");
        ctx.register(TOP_LINES_TABLE, sql_result.clone());
        let summary = ctx
            .table(TOP_LINES_TABLE)?
            .aggregate(vec![], vec![avg(col("num_lines")).alias("avg_num_lines")])?;
        println!("\n{}\n", summary.to_pipeline());
        let top_lines_summary = summary.collect()?;
        pretty::print_batches(&[top_lines_summary.clone()])?;

        info!("running the pipeline");
        println!("\n{}\n", pipeline.to_pipeline());
        let pipeline_result = pipeline.collect()?;
        pretty::print_batches(&[pipeline_result.clone()])?;

        let formulations_agree = sql_result == pipeline_result;
        if formulations_agree {
            info!("SQL and pipeline results are equal");
        } else {
            warn!("SQL and pipeline results differ");
        }

        info!("translating the report query");
        let translated = ctx.sql_to_pipeline(&sql)?;
        println!("\n{translated}\n");

        info!("translating a window-function query");
        let window_error = match ctx.sql_to_pipeline(WINDOW_SQL) {
            Err(e @ Error::Unsupported { .. }) => {
                info!(error = %e, "translation rejected");
                println!("{WINDOW_SQL}\n-> {e}");
                Some(e.to_string())
            }
            Err(e) => return Err(e),
            Ok(text) => {
                warn!(pipeline = %text, "window-function query was translated");
                None
            }
        };

        Ok(ReportOutcome {
            tables,
            sql_result,
            top_lines_summary,
            pipeline_result,
            formulations_agree,
            translated,
            window_error,
        })
    })
}
