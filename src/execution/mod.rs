pub mod context;
pub mod dataframe;
