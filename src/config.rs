use std::path::{Path, PathBuf};

/// The public transit-cost dataset.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/rfordatascience/tidytuesday/master/data/2021/2021-01-05/transit_cost.csv";

/// The store file used when none is given.
pub const DEFAULT_DATABASE: &str = "transit_cost.db";

/// The smallest number of lines a country needs to be reported.
pub const DEFAULT_MIN_LINES: u32 = 10;

/// The number of countries reported.
pub const DEFAULT_TOP: usize = 15;

/// Parameters of the transit-cost report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// CSV path or `http(s)://` URL of the transit-cost dataset.
    source: String,
    /// The SQLite file the relations are written to.
    database: PathBuf,
    /// Countries with fewer lines are left out.
    min_lines: u32,
    /// How many countries are kept.
    top: usize,
}

impl ReportConfig {
    /// Creates a [`ReportConfig`] with the default parameters.
    pub fn new() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            database: PathBuf::from(DEFAULT_DATABASE),
            min_lines: DEFAULT_MIN_LINES,
            top: DEFAULT_TOP,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_min_lines(mut self, min_lines: u32) -> Self {
        self.min_lines = min_lines;
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    pub fn min_lines(&self) -> u32 {
        self.min_lines
    }

    pub fn top(&self) -> usize {
        self.top
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::new()
    }
}
