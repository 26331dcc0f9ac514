pub mod config;
pub mod constants;
pub mod error;
pub mod filename;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
