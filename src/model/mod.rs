//! Explicit schemas of the two tables the report works on.

pub mod country;
pub mod transit;

pub use country::{country_codes_schema, CountryCode, COUNTRY_CODES_TABLE};
pub use transit::{transit_cost_schema, TransitRecord, TRANSIT_COST_TABLE};
