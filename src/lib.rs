//! Cagnotte - Telegram referral and rewards bot
//!
//! Users join through invite links, accrue an FCFA balance through referrals,
//! periodic bonuses and channel tasks, and request withdrawals once the
//! eligibility thresholds are met.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, and the pure decision logic
//!   (bonus cooldown, withdrawal validation)
//! - `storage`: SQLite-backed persistence behind an r2d2 pool
//! - `telegram`: Bot integration, dispatcher schema, and handlers
//! - `i18n`: Fluent-based French/English message catalog

pub mod cli;
pub mod core;
pub mod i18n;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, BotError};
pub use crate::storage::{create_pool, get_connection, DbConnection, DbPool};
pub use crate::telegram::{schema, HandlerDeps, HandlerError};
