//! Core utilities, configuration, and common functionality

pub mod bonus;
pub mod config;
pub mod error;
pub mod logging;
pub mod withdrawal;

// Re-exports for convenience
pub use error::{AppError, AppResult, BotError};
pub use logging::init_logger;
