use std::sync::{Arc, OnceLock};

use arrow::{
    array::{
        Array, ArrayRef, AsArray, Float64Array, Int64Array, PrimitiveArray, RecordBatch,
        StringArray,
    },
    datatypes::{ArrowPrimitiveType, DataType, Field, Float64Type, Int64Type, Schema, SchemaRef},
};
use snafu::location;

use crate::error::{Error, Result};

/// Name of the relation holding the transit-cost dataset.
pub const TRANSIT_COST_TABLE: &str = "transit_cost";

/// The explicit schema of the transit-cost dataset.
///
/// Every column is nullable, the published data has gaps in most of them.
pub fn transit_cost_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("e", DataType::Int64, true),
                Field::new("country", DataType::Utf8, true),
                Field::new("city", DataType::Utf8, true),
                Field::new("line", DataType::Utf8, true),
                Field::new("phase", DataType::Utf8, true),
                Field::new("start_year", DataType::Int64, true),
                Field::new("end_year", DataType::Int64, true),
                Field::new("rr", DataType::Int64, true),
                Field::new("length", DataType::Float64, true),
                Field::new("tunnel_per", DataType::Utf8, true),
                Field::new("tunnel", DataType::Float64, true),
                Field::new("stations", DataType::Int64, true),
                Field::new("source1", DataType::Utf8, true),
                Field::new("cost", DataType::Float64, true),
                Field::new("currency", DataType::Utf8, true),
                Field::new("year", DataType::Int64, true),
                Field::new("ppp_rate", DataType::Float64, true),
                Field::new("real_cost", DataType::Float64, true),
                Field::new("cost_km_millions", DataType::Float64, true),
                Field::new("source2", DataType::Utf8, true),
                Field::new("reference", DataType::Utf8, true),
            ]))
        })
        .clone()
}

/// One transit project, typed after [`transit_cost_schema`].
///
/// Only the columns used by the report are carried here, the remaining
/// columns of the schema are written as missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitRecord {
    pub country: Option<String>,
    pub city: Option<String>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
    pub cost_km_millions: Option<f64>,
    pub currency: Option<String>,
}

impl TransitRecord {
    /// Creates a new [`TransitRecord`] for a country and city.
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            city: Some(city.into()),
            ..Default::default()
        }
    }

    /// Creates a record whose city is missing.
    pub fn without_city(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Default::default()
        }
    }

    pub fn with_years(mut self, start_year: Option<i64>, end_year: Option<i64>) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    pub fn with_cost(mut self, cost_km_millions: f64, currency: impl Into<String>) -> Self {
        self.cost_km_millions = Some(cost_km_millions);
        self.currency = Some(currency.into());
        self
    }

    /// Builds a [`RecordBatch`] in the [`transit_cost_schema`] from records.
    ///
    /// The `e` column is numbered from 1 in input order.
    pub fn to_record_batch(records: &[TransitRecord]) -> Result<RecordBatch> {
        let schema = transit_cost_schema();
        let num_rows = records.len();

        let columns = schema
            .fields()
            .iter()
            .map(|field| -> ArrayRef {
                match field.name().as_str() {
                    "e" => Arc::new(Int64Array::from_iter_values(1..=num_rows as i64)),
                    "country" => utf8(records.iter().map(|r| r.country.as_deref())),
                    "city" => utf8(records.iter().map(|r| r.city.as_deref())),
                    "currency" => utf8(records.iter().map(|r| r.currency.as_deref())),
                    "start_year" => {
                        Arc::new(records.iter().map(|r| r.start_year).collect::<Int64Array>())
                    }
                    "end_year" => {
                        Arc::new(records.iter().map(|r| r.end_year).collect::<Int64Array>())
                    }
                    "cost_km_millions" => Arc::new(
                        records
                            .iter()
                            .map(|r| r.cost_km_millions)
                            .collect::<Float64Array>(),
                    ),
                    _ => arrow::array::new_null_array(field.data_type(), num_rows),
                }
            })
            .collect::<Vec<_>>();

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Reads the report columns of a batch back into records.
    ///
    /// The batch must carry `country`, `city`, `start_year`, `end_year`,
    /// `cost_km_millions` and `currency` with their schema types; any other
    /// column is ignored.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<TransitRecord>> {
        let country = string_column(batch, "country")?;
        let city = string_column(batch, "city")?;
        let currency = string_column(batch, "currency")?;
        let start_year = primitive_column::<Int64Type>(batch, "start_year")?;
        let end_year = primitive_column::<Int64Type>(batch, "end_year")?;
        let cost_km_millions = primitive_column::<Float64Type>(batch, "cost_km_millions")?;

        let value = |array: &StringArray, row: usize| {
            array.is_valid(row).then(|| array.value(row).to_string())
        };

        Ok((0..batch.num_rows())
            .map(|row| TransitRecord {
                country: value(country, row),
                city: value(city, row),
                start_year: start_year.is_valid(row).then(|| start_year.value(row)),
                end_year: end_year.is_valid(row).then(|| end_year.value(row)),
                cost_km_millions: cost_km_millions
                    .is_valid(row)
                    .then(|| cost_km_millions.value(row)),
                currency: value(currency, row),
            })
            .collect())
    }
}

fn utf8<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| Error::Schema {
        message: format!("Column '{name}' could not be found in schema"),
        location: location!(),
    })
}

fn type_mismatch(name: &str, array: &ArrayRef) -> Error {
    Error::Schema {
        message: format!("Column '{name}' has unexpected type {}", array.data_type()),
        location: location!(),
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    let array = column(batch, name)?;
    array
        .as_string_opt::<i32>()
        .ok_or_else(|| type_mismatch(name, array))
}

fn primitive_column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a PrimitiveArray<T>> {
    let array = column(batch, name)?;
    array
        .as_primitive_opt::<T>()
        .ok_or_else(|| type_mismatch(name, array))
}
