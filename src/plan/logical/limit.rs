use std::{fmt::Display, sync::Arc};

use arrow::datatypes::SchemaRef;

use super::plan::LogicalPlan;

/// Skips `skip` rows of its input and keeps at most `fetch` of the rest.
#[derive(Debug, Clone)]
pub struct Limit {
    input: Arc<LogicalPlan>,
    skip: usize,
    /// `None` keeps every row after the skipped ones.
    fetch: Option<usize>,
}

impl Limit {
    pub fn new(input: Arc<LogicalPlan>, skip: usize, fetch: Option<usize>) -> Self {
        Self { input, skip, fetch }
    }

    pub fn input(&self) -> &LogicalPlan {
        &self.input
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn fetch(&self) -> Option<usize> {
        self.fetch
    }

    /// Same as the input schema.
    pub fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    pub fn children(&self) -> Vec<&LogicalPlan> {
        vec![&self.input]
    }

    /// The `.limit(..)` builder call that adds this node.
    ///
    /// Unlike the other steps it cannot fail, so no `?` follows.
    pub fn pipeline_step(&self) -> String {
        match self.fetch {
            Some(fetch) => format!(".limit({}, Some({fetch}))", self.skip),
            None => format!(".limit({}, None)", self.skip),
        }
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fetch {
            Some(fetch) => write!(f, "Limit: skip={}, fetch={fetch}", self.skip),
            None => write!(f, "Limit: skip={}", self.skip),
        }
    }
}
