//! Chat-join-request handling
//!
//! A join request to a channel that backs a task counts as completing that
//! task for known users. The reward itself is granted later, the first time
//! the evaluator sees the record.

use teloxide::types::ChatJoinRequest;

use super::types::{HandlerDeps, HandlerError};
use crate::storage::db;
use crate::storage::get_connection;

pub(super) async fn handle_join_request(req: &ChatJoinRequest, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user_id = i64::try_from(req.from.id.0).unwrap_or(0);
    let conn = get_connection(&deps.db_pool)?;

    if db::get_user(&conn, user_id)?.is_none() {
        log::debug!("join request from unknown user {} to chat {}", user_id, req.chat.id);
        return Ok(());
    }

    match db::find_task_by_chat(&conn, req.chat.id.0)? {
        Some(task) => {
            if db::record_completion(&conn, user_id, &task.id)? {
                log::info!(
                    "user {} completed task '{}' via join request to chat {}",
                    user_id,
                    task.id,
                    req.chat.id
                );
            }
        }
        None => log::debug!("join request to chat {} matches no task", req.chat.id),
    }
    Ok(())
}
