pub mod args;
pub mod database;
pub mod error;
pub mod model;
pub mod queries;
pub mod utils;
