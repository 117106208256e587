pub mod logical;
pub mod physical;
pub mod planner;
