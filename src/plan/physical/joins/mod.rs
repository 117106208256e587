pub mod hash_join;
pub mod utils;
