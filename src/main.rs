use std::{path::PathBuf, process::ExitCode};

use arrow::util::pretty;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use transit_report::{
    config::{ReportConfig, DEFAULT_DATABASE, DEFAULT_MIN_LINES, DEFAULT_SOURCE, DEFAULT_TOP},
    error::Result,
    report::{run_report, schema_session},
    store::with_store,
};

#[derive(Parser)]
#[command(
    name = "transit-report",
    version,
    about = "Reports the countries with the most transit lines, in SQL and as a dataframe pipeline."
)]
struct Cli {
    #[arg(
        long,
        help = "CSV path or http(s) URL of the transit-cost dataset",
        env = "TRANSIT_COST_SOURCE",
        default_value = DEFAULT_SOURCE
    )]
    source: String,

    #[arg(
        long,
        help = "SQLite file the relations are written to",
        env = "TRANSIT_REPORT_DB",
        default_value = DEFAULT_DATABASE
    )]
    database: PathBuf,

    #[arg(
        long,
        help = "Smallest number of lines a reported country has",
        default_value_t = DEFAULT_MIN_LINES
    )]
    min_lines: u32,

    #[arg(long, help = "Number of countries reported", default_value_t = DEFAULT_TOP)]
    top: usize,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Set level of verbosity. [default: INFO]\n\t-v: DEBUG\n\t-vv: TRACE\n--quiet takes precedence over --verbose."
    )]
    verbose: u8,

    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Only show ERROR logs. --quiet takes precedence over --verbose."
    )]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the full report (default).
    Report,
    /// Runs SQL against the store and prints the result.
    Query { sql: String },
    /// Prints the dataframe pipeline a SQL query translates to.
    Translate { sql: String },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else {
        match verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ReportConfig::new()
        .with_source(cli.source)
        .with_database(cli.database)
        .with_min_lines(cli.min_lines)
        .with_top(cli.top);

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => {
            let outcome = run_report(&config)?;
            info!(
                countries = outcome.pipeline_result.num_rows(),
                agree = outcome.formulations_agree,
                "report finished"
            );
        }
        Commands::Query { sql } => with_store(config.database(), |store| {
            let batch = store.query(&sql)?;
            pretty::print_batches(&[batch])?;
            Ok(())
        })?,
        Commands::Translate { sql } => {
            println!("{}", schema_session().sql_to_pipeline(&sql)?);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
