//! Handler types and shared dependencies

use std::sync::Arc;

use crate::storage::db;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<db::DbPool>,
    /// Bot's @username, resolved once at startup; used in referral links and
    /// operations-chat announcements.
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<db::DbPool>, bot_username: Option<String>) -> Self {
        Self { db_pool, bot_username }
    }
}
