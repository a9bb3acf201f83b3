//! Channel-membership eligibility checks
//!
//! Lookups are total: any API failure (the user never interacted with the
//! channel, rate limit, missing permission) counts as "not a member" so
//! callers never have to handle an error.

use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, UserId};

use crate::core::config;

/// Whether a chat-member status counts as currently belonging to the chat.
pub(crate) fn counts_as_member(status: ChatMemberStatus) -> bool {
    !matches!(status, ChatMemberStatus::Left | ChatMemberStatus::Banned)
}

/// Returns whether the user currently belongs to a single chat.
pub async fn is_chat_member(bot: &Bot, chat_id: ChatId, user_id: UserId) -> bool {
    match bot.get_chat_member(chat_id, user_id).await {
        Ok(member) => counts_as_member(member.status()),
        Err(e) => {
            log::debug!("get_chat_member failed for user {} in chat {}: {}", user_id, chat_id.0, e);
            false
        }
    }
}

/// A user account is valid when it is a current member of every required channel.
pub async fn is_account_valid(bot: &Bot, user_id: UserId) -> bool {
    for channel in config::channels::REQUIRED.iter() {
        if !is_chat_member(bot, ChatId(*channel), user_id).await {
            return false;
        }
    }
    true
}
