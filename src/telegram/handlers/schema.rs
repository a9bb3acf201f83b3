//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatJoinRequest, Message};

use super::callbacks::handle_callback_query;
use super::commands::{handle_channel_command, handle_start_command};
use super::join_requests::handle_join_request;
use super::messages::handle_text_message;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::{command_payload, is_command};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. The same schema is used in production and in tests.
///
/// # Arguments
/// * `deps` - Handler dependencies (database pool, bot identity)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_start = deps.clone();
    let deps_messages = deps.clone();
    let deps_join = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // /start must run before the generic text handler
        .branch(start_handler(deps_start))
        .branch(channel_handler())
        // Message handler for button captions and status-driven input
        .branch(message_handler(deps_messages))
        // Join requests auto-complete channel tasks
        .branch(join_request_handler(deps_join))
        // Callback query handler
        .branch(callback_handler(deps_callback))
}

/// Handler for /start with an optional referral payload
fn start_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| is_command(text, "start")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let payload = msg
                    .text()
                    .and_then(|text| command_payload(text, "start"))
                    .unwrap_or_default()
                    .to_string();
                log::info!("🎯 /start from chat {} (payload: '{}')", msg.chat.id, payload);

                if let Err(e) = handle_start_command(&bot, &msg, &payload, &deps).await {
                    log::error!("/start handler failed for chat {}: {:?}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

/// Handler for the unlisted /channel operator command
fn channel_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| is_command(text, "channel")).unwrap_or(false))
        .endpoint(|bot: Bot, msg: Message| async move {
            if let Err(e) = handle_channel_command(&bot, &msg).await {
                log::error!("/channel handler failed for chat {}: {:?}", msg.chat.id, e);
            }
            Ok(())
        })
}

/// Handler for regular text messages
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_text_message(&bot, &msg, &deps).await {
                    log::error!("Error handling message from chat {}: {:?}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

/// Handler for chat join requests
fn join_request_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_chat_join_request().endpoint(move |req: ChatJoinRequest| {
        let deps = deps.clone();
        async move {
            if let Err(e) = handle_join_request(&req, &deps).await {
                log::error!("Error handling join request to chat {}: {:?}", req.chat.id, e);
            }
            Ok(())
        }
    })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = handle_callback_query(&bot, &q, &deps).await {
                log::error!("Error handling callback from user {}: {:?}", q.from.id, e);
            }
            Ok(())
        }
    })
}
