pub mod config;
pub mod errors;
pub mod retry;
pub mod types;
