pub mod aggregate;
pub mod filter;
pub mod joins;
pub mod limit;
pub mod plan;
pub mod projection;
pub mod scan;
pub mod sort;
