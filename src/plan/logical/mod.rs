pub mod aggregate;
pub mod filter;
pub mod join;
pub mod limit;
pub mod pipeline;
pub mod plan;
pub mod projection;
pub mod scan;
pub mod sort;
