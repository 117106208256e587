use std::{collections::HashMap, sync::Arc};

use arrow::array::RecordBatch;
use snafu::location;
use tracing::debug;

use crate::{
    error::{Error, Result},
    io::{memory::MemTable, DataSource},
    plan::logical::{plan::LogicalPlan, scan::Scan},
    sql::sql_to_plan,
};

use super::dataframe::DataFrame;

/// Represents a [`SessionContext`] for managing query execution.
///
/// Holds the named tables that dataframes and SQL text can refer to.
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    tables: HashMap<String, Arc<dyn DataSource>>,
}

impl SessionContext {
    /// Creates a new [`SessionContext`] instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an in-memory batch under `name`, replacing any previous table.
    pub fn register(&mut self, name: impl Into<String>, batch: RecordBatch) {
        self.register_source(name, Arc::new(MemTable::new(batch)));
    }

    /// Registers any [`DataSource`] under `name`, replacing any previous table.
    pub fn register_source(&mut self, name: impl Into<String>, source: Arc<dyn DataSource>) {
        let name = name.into();
        debug!(table = %name, "registering table");
        self.tables.insert(name, source);
    }

    /// Looks up a registered table.
    pub fn source(&self, name: &str) -> Option<Arc<dyn DataSource>> {
        self.tables.get(name).cloned()
    }

    /// Starts a [`DataFrame`] that scans the table registered under `name`.
    pub fn table(&self, name: &str) -> Result<DataFrame> {
        let source = self.source(name).ok_or_else(|| Error::Reference {
            message: format!("no such table: {name}"),
            location: location!(),
        })?;

        Ok(DataFrame::new(LogicalPlan::Scan(Scan::new(name, source))))
    }

    /// Plans a SQL query against the registered tables.
    pub fn sql(&self, sql: &str) -> Result<DataFrame> {
        Ok(DataFrame::new(sql_to_plan(self, sql)?))
    }

    /// Translates a SQL query into the equivalent dataframe program text,
    /// without executing it.
    pub fn sql_to_pipeline(&self, sql: &str) -> Result<String> {
        Ok(self.sql(sql)?.to_pipeline())
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::Error, tests::create_record_batch};

    use super::SessionContext;

    #[test]
    fn test_session_context_tables() {
        let mut ctx = SessionContext::new();
        ctx.register("simple", create_record_batch());

        let df = ctx.table("simple").unwrap();
        assert_eq!(df.schema(), create_record_batch().schema());
        assert_eq!(df.to_pipeline(), r#"ctx.table("simple")?"#);

        let result = ctx.table("missing");
        assert!(matches!(result, Err(Error::Reference { .. })));
    }
}
