use std::{fmt::Display, sync::Arc};

use arrow::datatypes::SchemaRef;

use crate::io::DataSource;

use super::plan::LogicalPlan;

/// A scan operation on a [`DataSource`].
#[derive(Debug, Clone)]
pub struct Scan {
    /// The name the source is registered under.
    name: String,
    /// A reference-counted [`DataSource`] to be scanned.
    source: Arc<dyn DataSource>,
}

impl Scan {
    /// Creates a new [`Scan`] instance.
    pub fn new(name: impl Into<String>, source: Arc<dyn DataSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// The name the source is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scanned [`DataSource`].
    pub fn source(&self) -> Arc<dyn DataSource> {
        self.source.clone()
    }

    /// A reference-counted [`arrow::datatypes::Schema`] of the data source.
    pub fn schema(&self) -> SchemaRef {
        self.source.schema()
    }

    /// Retrieves the child logical plans.
    ///
    /// Since [`Scan`] has no children, this returns an empty vector.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![]
    }
}

impl Display for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scan: {}", self.name)
    }
}
