//! Country-code normalization of the transit dataset.

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, AsArray, RecordBatch, StringArray},
    datatypes::DataType,
};
use snafu::location;
use tracing::debug;

use crate::error::{Error, Result};

/// The column holding the two-letter country code.
pub const COUNTRY_COLUMN: &str = "country";

/// The non-standard code the dataset uses for the United Kingdom.
pub const UK_ALIAS: &str = "UK";

/// The ISO 3166-1 alpha-2 code of the United Kingdom.
pub const UK_ISO2C: &str = "GB";

/// Replaces every `UK` country code with `GB`.
///
/// All other values, including missing ones, are left untouched. The result
/// is a new batch; applying the function again changes nothing.
pub fn normalize_country_codes(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let (index, field) = schema
        .column_with_name(COUNTRY_COLUMN)
        .ok_or_else(|| Error::Schema {
            message: format!("Column '{COUNTRY_COLUMN}' could not be found in schema"),
            location: location!(),
        })?;

    if field.data_type() != &DataType::Utf8 {
        return Err(Error::Schema {
            message: format!(
                "Column '{COUNTRY_COLUMN}' must be Utf8, found {}",
                field.data_type()
            ),
            location: location!(),
        });
    }

    let codes = batch.column(index).as_string::<i32>();
    let mut replaced = 0usize;
    let normalized = codes
        .iter()
        .map(|code| match code {
            Some(UK_ALIAS) => {
                replaced += 1;
                Some(UK_ISO2C)
            }
            other => other,
        })
        .collect::<StringArray>();
    debug!(replaced, "normalized country codes");

    let mut columns = batch.columns().to_vec();
    columns[index] = Arc::new(normalized) as ArrayRef;

    Ok(RecordBatch::try_new(schema, columns)?)
}
