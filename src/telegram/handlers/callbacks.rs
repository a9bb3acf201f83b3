//! Callback-query routing: verify, addNum, and task checks
//!
//! Callback data is an underscore-delimited token list; the first token picks
//! the sub-command and the rest are its arguments.

use teloxide::prelude::*;

use super::types::{HandlerDeps, HandlerError};
use crate::i18n::{self, t};
use crate::storage::db::{self, UserStatus};
use crate::storage::get_connection;
use crate::telegram::{keyboards, membership, tasks};
use unic_langid::LanguageIdentifier;

pub(super) async fn handle_callback_query(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(data) = q.data.as_deref() else { return Ok(()) };
    log::debug!("callback data '{}' from user {}", data, q.from.id);

    let lang = i18n::lang_from_telegram_code(q.from.language_code.as_deref());
    let mut tokens = data.split('_');
    let command = tokens.next().unwrap_or_default();

    match command {
        "verify" => handle_verify(bot, q, &lang).await?,
        "addNum" => handle_add_number(bot, q, &lang, deps).await?,
        "task" => {
            let task_ids: Vec<&str> = tokens.filter(|token| !token.is_empty()).collect();
            handle_task_check(bot, q, &lang, deps, &task_ids).await?;
        }
        other => {
            log::debug!("unknown callback command '{}'", other);
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

/// Re-runs the membership verifier when the register button is pressed.
async fn handle_verify(bot: &Bot, q: &CallbackQuery, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;

    bot.answer_callback_query(q.id.clone()).await?;
    if membership::is_account_valid(bot, q.from.id).await {
        bot.send_message(chat_id, t(lang, "verify.welcome"))
            .reply_markup(keyboards::main_keyboard(lang))
            .await?;
    } else {
        bot.send_message(chat_id, t(lang, "verify.invalid")).await?;
    }
    Ok(())
}

/// Prompts for the payout number and arms the AddingNum status cursor.
async fn handle_add_number(
    bot: &Bot,
    q: &CallbackQuery,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let user_id = i64::try_from(q.from.id.0).unwrap_or(0);

    {
        let conn = get_connection(&deps.db_pool)?;
        db::set_status(&conn, user_id, UserStatus::AddingNum)?;
    }

    bot.answer_callback_query(q.id.clone()).await?;
    bot.send_message(chat_id, t(lang, "number.prompt")).await?;
    Ok(())
}

/// Evaluates the offered tasks on a Check press and re-renders the list.
async fn handle_task_check(
    bot: &Bot,
    q: &CallbackQuery,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
    task_ids: &[&str],
) -> Result<(), HandlerError> {
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let conn = get_connection(&deps.db_pool)?;
    let eval = tasks::evaluate_tasks(bot, &conn, q.from.id, task_ids).await?;

    if eval.completed.is_empty() {
        bot.answer_callback_query(q.id.clone()).text(t(lang, "task.alert")).await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    if eval.remaining.is_empty() {
        bot.delete_message(chat_id, message_id).await?;
        bot.send_message(chat_id, t(lang, "task.done")).await?;
        return Ok(());
    }

    let ids: Vec<&str> = eval.remaining.iter().map(|task| task.id.as_str()).collect();
    bot.edit_message_text(chat_id, message_id, tasks::render_task_list(lang, &eval.remaining, eval.completed.len()))
        .reply_markup(keyboards::check_keyboard(lang, &ids))
        .link_preview_options(tasks::no_link_preview())
        .await?;
    Ok(())
}
