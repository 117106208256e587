pub mod aggregate;
pub mod binary;
pub mod column;
pub mod expr;
pub mod is_null;
pub mod literal;
pub mod sort;
