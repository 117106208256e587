//! # Transit Report
//!
//! Loads the public transit-cost dataset, joins it with ISO country names and
//! reports the countries with the most transit lines. The same report is
//! computed three ways: as SQL against an embedded store, as a dataframe
//! pipeline, and as SQL translated into that pipeline.

pub mod config;
pub mod error;
pub mod execution;
pub mod expression;
pub mod io;
pub mod model;
pub mod normalize;
pub mod plan;
pub mod report;
pub mod sql;
pub mod store;
