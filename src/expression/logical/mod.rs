pub mod aggregate;
pub mod alias;
pub mod binary;
pub mod column;
pub mod expr;
pub mod expr_fn;
pub mod sort;
