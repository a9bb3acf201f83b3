//! Text-message routing: menu buttons and status-driven input
//!
//! A text either matches a menu-button caption (in any supported language) or
//! falls through to the user's status cursor: `AddingNum` consumes it as the
//! payout number, `Withdraw` consumes it as a requested amount when it parses
//! as a positive integer. Anything else is ignored.

use chrono::Utc;
use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use crate::core::bonus::{self, BonusOutcome};
use crate::core::config;
use crate::core::withdrawal::{self, WithdrawalCheck};
use crate::i18n::{self, t, t_args};
use crate::storage::db::{self, User, UserStatus};
use crate::storage::{get_connection, DbConnection};
use crate::telegram::keyboards::{self, MenuAction};
use crate::telegram::{notifications, tasks};
use unic_langid::LanguageIdentifier;

pub(super) async fn handle_text_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else { return Ok(()) };
    let Some(from) = msg.from.as_ref() else { return Ok(()) };
    let lang = i18n::lang_from_telegram_code(from.language_code.as_deref());
    let user_id = i64::try_from(from.id.0).unwrap_or(0);

    let conn = get_connection(&deps.db_pool)?;
    let Some(user) = db::get_user(&conn, user_id)? else {
        // Text from someone who never ran /start; nothing to act on.
        log::debug!("text from unknown user {}", user_id);
        return Ok(());
    };

    if let Some(action) = keyboards::menu_action(text) {
        match action {
            MenuAction::Bonus => handle_bonus(bot, msg, &lang, &conn, &user).await?,
            MenuAction::Balance => handle_balance(bot, msg, &lang, &user).await?,
            MenuAction::Share => handle_share(bot, msg, &lang, deps).await?,
            MenuAction::Procedure => {
                bot.send_message(msg.chat.id, t(&lang, "procedure"))
                    .reply_markup(keyboards::main_keyboard(&lang))
                    .await?;
            }
            MenuAction::AddNumber => handle_add_number_menu(bot, msg, &lang, &user).await?,
            MenuAction::Withdraw => handle_withdraw_init(bot, msg, &lang, &conn, &user).await?,
            MenuAction::Tasks => tasks::show_task_list(bot, msg.chat.id, &lang, &conn, user_id).await?,
        }
        return Ok(());
    }

    match user.status {
        UserStatus::AddingNum => {
            db::set_account_number(&conn, user_id, text)?;
            log::info!("user {} saved a payout number", user_id);
            bot.send_message(msg.chat.id, t(&lang, "number.saved"))
                .reply_markup(keyboards::main_keyboard(&lang))
                .await?;
        }
        UserStatus::Withdraw => {
            if let Ok(amount) = text.trim().parse::<i64>() {
                if amount > 0 {
                    handle_withdraw_amount(bot, msg, &lang, &conn, &user, amount, deps).await?;
                }
            }
        }
        UserStatus::Idle => {}
    }
    Ok(())
}

async fn handle_bonus(
    bot: &Bot,
    msg: &Message,
    lang: &LanguageIdentifier,
    conn: &DbConnection,
    user: &User,
) -> Result<(), HandlerError> {
    match bonus::evaluate(user.last_bonus_date, Utc::now()) {
        BonusOutcome::Granted => {
            db::grant_bonus(conn, user.telegram_id, config::rewards::BONUS_REWARD, Utc::now())?;
            log::info!("user {} claimed the {} FCFA bonus", user.telegram_id, config::rewards::BONUS_REWARD);
            let mut args = FluentArgs::new();
            args.set("amount", config::rewards::BONUS_REWARD);
            bot.send_message(msg.chat.id, t_args(lang, "bonus.win", &args)).await?;
        }
        BonusOutcome::Cooldown { hours, minutes, seconds } => {
            let mut args = FluentArgs::new();
            args.set("hours", hours);
            args.set("minutes", minutes);
            args.set("seconds", seconds);
            bot.send_message(msg.chat.id, t_args(lang, "bonus.wait", &args))
                .reply_markup(keyboards::main_keyboard(lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_balance(bot: &Bot, msg: &Message, lang: &LanguageIdentifier, user: &User) -> Result<(), HandlerError> {
    let mut args = FluentArgs::new();
    args.set("amount", user.amount);
    args.set("invited", user.invited_users);
    args.set(
        "number",
        user.account_number
            .clone()
            .unwrap_or_else(|| t(lang, "account.no-number")),
    );
    bot.send_message(msg.chat.id, t_args(lang, "account.summary", &args))
        .reply_markup(keyboards::main_keyboard(lang))
        .await?;
    Ok(())
}

async fn handle_share(bot: &Bot, msg: &Message, lang: &LanguageIdentifier, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let bot_username = deps.bot_username.as_deref().unwrap_or("cagnotte_bot");
    let user_id = msg.from.as_ref().map(|from| from.id.0).unwrap_or(0);
    let link = format!(
        "https://t.me/{}?start={}{}",
        bot_username,
        config::rewards::REFERRAL_PREFIX,
        user_id
    );

    let mut args = FluentArgs::new();
    args.set("link", link);
    args.set("reward", config::rewards::REFERRAL_REWARD);
    bot.send_message(msg.chat.id, t_args(lang, "share", &args))
        .reply_markup(keyboards::main_keyboard(lang))
        .await?;
    Ok(())
}

async fn handle_add_number_menu(
    bot: &Bot,
    msg: &Message,
    lang: &LanguageIdentifier,
    user: &User,
) -> Result<(), HandlerError> {
    let mut args = FluentArgs::new();
    args.set(
        "number",
        user.account_number
            .clone()
            .unwrap_or_else(|| t(lang, "account.no-number")),
    );
    bot.send_message(msg.chat.id, t_args(lang, "number.current", &args))
        .reply_markup(keyboards::settings_keyboard(lang))
        .await?;
    Ok(())
}

async fn handle_withdraw_init(
    bot: &Bot,
    msg: &Message,
    lang: &LanguageIdentifier,
    conn: &DbConnection,
    user: &User,
) -> Result<(), HandlerError> {
    if user.amount < config::withdrawal::MIN_AMOUNT {
        let mut args = FluentArgs::new();
        args.set("amount", user.amount);
        bot.send_message(msg.chat.id, t_args(lang, "withdraw.min-balance", &args)).await?;
        return Ok(());
    }
    if user.account_number.is_none() {
        bot.send_message(msg.chat.id, t(lang, "withdraw.missing-number")).await?;
        return Ok(());
    }

    db::set_status(conn, user.telegram_id, UserStatus::Withdraw)?;
    bot.send_message(msg.chat.id, t(lang, "withdraw.prompt")).await?;
    Ok(())
}

/// Runs the withdrawal-approval flow for an amount entered while the status
/// cursor is `Withdraw`. Rejections reply and keep the cursor in place.
async fn handle_withdraw_amount(
    bot: &Bot,
    msg: &Message,
    lang: &LanguageIdentifier,
    conn: &DbConnection,
    user: &User,
    amount: i64,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match withdrawal::validate(amount, user.amount, user.invited_users) {
        WithdrawalCheck::InsufficientBalance => {
            let mut args = FluentArgs::new();
            args.set("amount", user.amount);
            bot.send_message(msg.chat.id, t_args(lang, "withdraw.insufficient", &args)).await?;
        }
        WithdrawalCheck::BelowMinimum => {
            bot.send_message(msg.chat.id, t(lang, "withdraw.below-minimum")).await?;
        }
        WithdrawalCheck::NotEnoughInvites => {
            let mut args = FluentArgs::new();
            args.set("name", html::escape(&user.user_name));
            args.set("invited", user.invited_users);
            args.set("required", config::withdrawal::MIN_INVITED_USERS);
            bot.send_message(msg.chat.id, t_args(lang, "withdraw.need-invites", &args))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        WithdrawalCheck::Approved => {
            if db::try_withdraw(conn, user.telegram_id, amount)? {
                log::info!("user {} withdrew {} FCFA", user.telegram_id, amount);
                bot.send_message(msg.chat.id, t(lang, "withdraw.done")).await?;
                notifications::notify_withdrawal_approved(
                    bot,
                    user.telegram_id,
                    &user.user_name,
                    amount,
                    deps.bot_username.as_deref(),
                )
                .await;
            } else {
                // The balance moved between the read and the commit; report
                // the fresh value and keep the cursor in Withdraw.
                let current = db::get_user(conn, user.telegram_id)?.map(|u| u.amount).unwrap_or(0);
                let mut args = FluentArgs::new();
                args.set("amount", current);
                bot.send_message(msg.chat.id, t_args(lang, "withdraw.insufficient", &args)).await?;
            }
        }
    }
    Ok(())
}
