pub mod config;
pub mod console;
pub mod server;

pub use validator_lib::ERRORS_LOG_FILE;
