use std::{
    io::{Cursor, Read},
    sync::Arc,
};

use arrow::{
    array::{Array, ArrayRef, AsArray, RecordBatch, StringArray},
    compute::{cast_with_options, concat_batches, CastOptions},
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema, SchemaRef},
};
use snafu::location;

use crate::error::{Error, Result};

/// How many records should be read in order to infer the CSV header.
const MAX_INFER_RECORDS: usize = 100;

/// The number of records to read per batch.
const DEFAULT_BATCH_SIZE: usize = 1024;

/// Text values that are read as missing, besides the empty string.
const MISSING_MARKERS: &[&str] = &["NA"];

/// A builder for [`CsvReadOptions`].
#[derive(Debug)]
pub struct CsvReadOptionsBuilder {
    /// Whether the first row should be treated as a header.
    has_header: bool,
    /// The byte used as a field delimiter.
    delimiter: u8,
    /// The byte used for quoting fields.
    quote: u8,
    /// The number of records to read per batch.
    batch_size: usize,
}

impl CsvReadOptionsBuilder {
    /// Creates a [`CsvReadOptionsBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a boolean flag, whether a header is present or not.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Adds a byte for the `delimiter`.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Adds a byte for the `quote`.
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Sets the number of records read per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builds the final [`CsvReadOptions`].
    pub fn build(self) -> CsvReadOptions {
        CsvReadOptions {
            has_header: self.has_header,
            delimiter: self.delimiter,
            quote: self.quote,
            batch_size: self.batch_size,
        }
    }
}

impl Default for CsvReadOptionsBuilder {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Configuration options for reading CSV files.
#[derive(Debug)]
pub struct CsvReadOptions {
    /// Whether the first row should be treated as a header.
    has_header: bool,
    /// The character used as a field delimiter.
    delimiter: u8,
    /// The character used for quoting fields.
    quote: u8,
    /// The number of records to read per batch.
    batch_size: usize,
}

impl CsvReadOptions {
    /// Creates a [`CsvReadOptions`] instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`CsvReadOptionsBuilder`].
    pub fn builder() -> CsvReadOptionsBuilder {
        CsvReadOptionsBuilder::default()
    }

    fn format(&self) -> Format {
        Format::default()
            .with_header(self.has_header)
            .with_delimiter(self.delimiter)
            .with_quote(self.quote)
    }
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        CsvReadOptionsBuilder::new().build()
    }
}

/// Reads CSV data into a single [`RecordBatch`] bound to `schema`.
///
/// Columns are matched by header name. Columns of the file that are not in
/// `schema` are ignored, columns of `schema` that are not in the file are a
/// schema error. Every value is read as text first and then cast to the
/// schema type; `NA`, empty strings and text that does not parse as the
/// target type become missing values.
pub fn read_csv(
    mut reader: impl Read,
    schema: SchemaRef,
    options: &CsvReadOptions,
) -> Result<RecordBatch> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let raw_schema = text_schema(&bytes, options)?;
    let csv_reader = ReaderBuilder::new(raw_schema.clone())
        .with_format(options.format())
        .with_batch_size(options.batch_size)
        .build(Cursor::new(bytes))?;

    let batches = csv_reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let raw = concat_batches(&raw_schema, &batches)?;

    bind_schema(&raw, schema)
}

/// Reads the header and describes every column in the file as nullable text.
fn text_schema(bytes: &[u8], options: &CsvReadOptions) -> Result<SchemaRef> {
    let (inferred, _) = options
        .format()
        .infer_schema(Cursor::new(bytes), Some(MAX_INFER_RECORDS))?;
    let fields = inferred
        .fields()
        .iter()
        .map(|field| Field::new(field.name(), DataType::Utf8, true))
        .collect::<Vec<_>>();

    Ok(Arc::new(Schema::new(fields)))
}

/// Projects a text batch onto `schema`, casting each column to its type.
fn bind_schema(raw: &RecordBatch, schema: SchemaRef) -> Result<RecordBatch> {
    let options = CastOptions {
        safe: true,
        ..Default::default()
    };

    let columns = schema
        .fields()
        .iter()
        .map(|field| -> Result<ArrayRef> {
            let column = raw
                .column_by_name(field.name())
                .ok_or_else(|| Error::Schema {
                    message: format!("Column '{}' is missing from the CSV header", field.name()),
                    location: location!(),
                })?;
            let text = blank_missing_markers(column.as_string::<i32>());
            Ok(cast_with_options(&text, field.data_type(), &options)?)
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn blank_missing_markers(values: &StringArray) -> ArrayRef {
    let values = values
        .iter()
        .map(|v| v.filter(|v| !v.is_empty() && !MISSING_MARKERS.contains(v)))
        .collect::<StringArray>();
    Arc::new(values)
}
