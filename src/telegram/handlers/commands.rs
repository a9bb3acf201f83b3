//! Command handler implementations (/start, /channel)

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{Message, MessageOrigin, ParseMode};
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::i18n::{self, t, t_args};
use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::{keyboards, membership};

/// Parses a `/start` deep-link payload of the form `ref_<inviterId>`.
pub(crate) fn parse_referral_payload(payload: &str) -> Option<i64> {
    payload
        .strip_prefix(config::rewards::REFERRAL_PREFIX)?
        .parse()
        .ok()
        .filter(|id: &i64| *id > 0)
}

/// Handle /start: create the user (crediting a referral if carried), then
/// gate the main menu behind channel membership.
pub(super) async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    payload: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(from) = msg.from.as_ref() else { return Ok(()) };
    let lang = i18n::lang_from_telegram_code(from.language_code.as_deref());
    let user_id = i64::try_from(from.id.0).unwrap_or(0);

    {
        let conn = get_connection(&deps.db_pool)?;
        if db::get_user(&conn, user_id)?.is_none() {
            if !payload.is_empty() {
                match parse_referral_payload(payload) {
                    Some(inviter_id) => {
                        match db::credit_referral(&conn, inviter_id, config::rewards::REFERRAL_REWARD)? {
                            Some(inviter_name) => {
                                let mut args = FluentArgs::new();
                                args.set("name", inviter_name);
                                bot.send_message(msg.chat.id, t_args(&lang, "invited-by", &args)).await?;
                            }
                            None => log::warn!("/start payload referenced unknown inviter {}", inviter_id),
                        }
                    }
                    None => log::warn!("/start carried malformed payload '{}'", payload),
                }
            }
            db::create_user(&conn, user_id, &from.first_name, config::rewards::bonus_epoch())?;
            log::info!("Created user {} ({})", user_id, from.first_name);
        }
    }

    if !membership::is_account_valid(bot, from.id).await {
        let mut args = FluentArgs::new();
        args.set("name", html::escape(&from.first_name));
        args.set("channels", config::channels::INVITE_LINKS.join("\n"));
        bot.send_message(msg.chat.id, t_args(&lang, "verify.prompt", &args))
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::verify_keyboard(&lang, from.id))
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, t(&lang, "start-keep-sharing"))
        .reply_markup(keyboards::main_keyboard(&lang))
        .await?;
    Ok(())
}

/// Handle /channel: operator tool echoing the origin chat id of a forwarded
/// channel post, used when wiring tasks to channels. No state change.
pub(super) async fn handle_channel_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    let Some(origin) = msg.reply_to_message().and_then(|reply| reply.forward_origin()) else {
        log::info!("/channel used without replying to a forwarded message in chat {}", msg.chat.id);
        return Ok(());
    };

    if let MessageOrigin::Channel { chat, .. } = origin {
        log::info!("/channel: forwarded message originates from chat {}", chat.id);
        bot.send_message(msg.chat.id, format!("Channel id: {}", chat.id)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_payload_parses_prefixed_ids() {
        assert_eq!(parse_referral_payload("ref_123456"), Some(123456));
    }

    #[test]
    fn referral_payload_rejects_other_shapes() {
        assert_eq!(parse_referral_payload(""), None);
        assert_eq!(parse_referral_payload("123456"), None);
        assert_eq!(parse_referral_payload("ref_"), None);
        assert_eq!(parse_referral_payload("ref_abc"), None);
        assert_eq!(parse_referral_payload("ref_-5"), None);
    }
}
