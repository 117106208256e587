use std::sync::{Arc, OnceLock};

use arrow::{
    array::{ArrayRef, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
};

use crate::{
    error::Result,
    io::csv::{read_csv, CsvReadOptions},
};

/// Name of the relation holding the country-code lookup table.
pub const COUNTRY_CODES_TABLE: &str = "country_codes";

/// The bundled lookup table, embedded at compile time.
const BUNDLED_COUNTRY_CODES: &str = include_str!("../../data/country_codes.csv");

/// The explicit schema of the country-code lookup table.
///
/// Column names are the snake_case spellings of the reference columns
/// `country.name.en`, `country.name.en.regex`, `iso.name.en`, `currency`,
/// `iso2c` and `iso3c`.
pub fn country_codes_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("country_name_en", DataType::Utf8, true),
                Field::new("country_name_en_regex", DataType::Utf8, true),
                Field::new("iso_name_en", DataType::Utf8, true),
                Field::new("currency", DataType::Utf8, true),
                Field::new("iso2c", DataType::Utf8, true),
                Field::new("iso3c", DataType::Utf8, true),
            ]))
        })
        .clone()
}

/// One recognized country, typed after [`country_codes_schema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryCode {
    pub country_name_en: String,
    pub country_name_en_regex: String,
    pub iso_name_en: String,
    pub currency: String,
    pub iso2c: String,
    pub iso3c: String,
}

impl CountryCode {
    /// Creates a [`CountryCode`] with only the join key and English name set.
    pub fn new(iso2c: impl Into<String>, country_name_en: impl Into<String>) -> Self {
        let country_name_en = country_name_en.into();
        Self {
            country_name_en_regex: country_name_en.to_lowercase(),
            iso_name_en: country_name_en.clone(),
            country_name_en,
            iso2c: iso2c.into(),
            ..Default::default()
        }
    }

    /// Loads the lookup table that ships with the crate.
    pub fn bundled() -> Result<RecordBatch> {
        read_csv(
            BUNDLED_COUNTRY_CODES.as_bytes(),
            country_codes_schema(),
            &CsvReadOptions::new(),
        )
    }

    /// Builds a [`RecordBatch`] in the [`country_codes_schema`] from codes.
    pub fn to_record_batch(codes: &[CountryCode]) -> Result<RecordBatch> {
        let column = |value: fn(&CountryCode) -> &str| -> ArrayRef {
            Arc::new(codes.iter().map(|c| Some(value(c))).collect::<StringArray>())
        };

        Ok(RecordBatch::try_new(
            country_codes_schema(),
            vec![
                column(|c| &c.country_name_en),
                column(|c| &c.country_name_en_regex),
                column(|c| &c.iso_name_en),
                column(|c| &c.currency),
                column(|c| &c.iso2c),
                column(|c| &c.iso3c),
            ],
        )?)
    }
}
