pub mod coercion;
pub mod logical;
pub mod operator;
pub mod physical;
pub mod values;
