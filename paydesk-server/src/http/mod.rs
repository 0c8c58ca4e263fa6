pub mod error;
pub mod problem;
