pub mod config;
pub mod observability;
pub mod path_validation;
pub mod test_def;
