//! Task list rendering and completion evaluation

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, UserId};
use unic_langid::LanguageIdentifier;

use crate::core::config;
use crate::core::AppResult;
use crate::i18n::{t, t_args};
use crate::storage::db::{self, Task, TaskKind};
use crate::storage::DbConnection;
use crate::telegram::{keyboards, membership};

/// Result of one evaluator run over the task ids of a Check press.
pub struct Evaluation {
    pub completed: Vec<Task>,
    pub remaining: Vec<Task>,
}

/// Link previews are disabled on task lists so the channel links stay compact.
pub fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Renders the task-list message body.
///
/// `done` is the count shown in the "Done: n/2" footer.
pub fn render_task_list(lang: &LanguageIdentifier, tasks: &[Task], done: usize) -> String {
    let mut items = String::new();
    for task in tasks {
        let mut args = FluentArgs::new();
        args.set("link", task.link.as_str());
        args.set("reward", task.reward);
        items.push_str(&t_args(lang, "task.item", &args));
    }
    format!(
        "{}:{}\n\n{}: {}/{}",
        t(lang, "task.main"),
        items,
        t(lang, "task.progress"),
        done,
        config::tasks::MAX_COMPLETED,
    )
}

/// Sends the task list for the user, or the "unavailable" notice once the
/// completion cap is reached.
pub async fn show_task_list(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    conn: &DbConnection,
    user_id: i64,
) -> AppResult<()> {
    let completed = db::completed_task_count(conn, user_id)? as usize;
    if completed >= config::tasks::MAX_COMPLETED {
        bot.send_message(chat_id, t(lang, "task.unavailable")).await?;
        return Ok(());
    }

    let offered = db::available_tasks(conn, user_id, config::tasks::MAX_COMPLETED)?;
    let done = config::tasks::MAX_COMPLETED - offered.len();
    let ids: Vec<&str> = offered.iter().map(|task| task.id.as_str()).collect();

    bot.send_message(chat_id, t(lang, "task.intro")).await?;
    bot.send_message(chat_id, render_task_list(lang, &offered, done))
        .reply_markup(keyboards::check_keyboard(lang, &ids))
        .link_preview_options(no_link_preview())
        .await?;
    Ok(())
}

/// Evaluates the task ids carried by a Check press.
///
/// Unknown ids are skipped. Self-reported tasks are complete when their
/// join-request record exists; membership tasks are checked live and recorded
/// on the spot. Every completed task routes through the one-shot reward claim,
/// so re-evaluating a finished task never credits twice.
pub async fn evaluate_tasks(
    bot: &Bot,
    conn: &DbConnection,
    user: UserId,
    task_ids: &[&str],
) -> AppResult<Evaluation> {
    let user_id = i64::try_from(user.0).unwrap_or(0);
    let mut completed = Vec::new();
    let mut remaining = Vec::new();

    for raw_id in task_ids {
        let task = match db::get_task(conn, raw_id)? {
            Some(task) => task,
            None => {
                log::warn!("Check payload referenced unknown task '{}'", raw_id);
                continue;
            }
        };

        let done = match task.kind {
            TaskKind::SelfReported => db::has_completed(conn, user_id, &task.id)?,
            TaskKind::Membership => match task.chat_id {
                Some(chat) => {
                    let member = membership::is_chat_member(bot, ChatId(chat), user).await;
                    if member {
                        db::record_completion(conn, user_id, &task.id)?;
                    }
                    member
                }
                None => {
                    log::warn!("membership task '{}' has no chat id", task.id);
                    false
                }
            },
        };

        if done {
            if db::claim_task_reward(conn, user_id, &task.id, task.reward)? {
                log::info!("user {} earned {} FCFA for task '{}'", user_id, task.reward, task.id);
            }
            completed.push(task);
        } else {
            remaining.push(task);
        }
    }

    Ok(Evaluation { completed, remaining })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::lang_from_code;
    use crate::storage::db::{create_pool, get_connection, upsert_task};
    use tempfile::NamedTempFile;

    fn task(id: &str, reward: i64, kind: TaskKind, chat_id: Option<i64>) -> Task {
        Task {
            id: id.to_string(),
            link: format!("https://t.me/{}", id),
            reward,
            priority: 0,
            kind,
            chat_id,
        }
    }

    #[test]
    fn renders_items_and_footer() {
        let lang = lang_from_code("en");
        let tasks = vec![task("a1", 500, TaskKind::Membership, Some(-1))];
        let text = render_task_list(&lang, &tasks, 1);

        assert!(text.contains("👉 https://t.me/a1"));
        assert!(text.contains("💸 Reward: 500 FCFA"));
        assert!(text.ends_with("Done: 1/2"));
    }

    #[test]
    fn renders_empty_list_with_footer_only() {
        let lang = lang_from_code("fr");
        let text = render_task_list(&lang, &[], 0);
        assert!(text.ends_with("Terminé: 0/2"));
    }

    #[tokio::test]
    async fn evaluator_handles_self_reported_tasks_without_api_calls() {
        let file = NamedTempFile::new().unwrap();
        let pool = create_pool(file.path().to_str().unwrap()).unwrap();
        let conn = get_connection(&pool).unwrap();

        db::create_user(&conn, 77, "Gus", crate::core::config::rewards::bonus_epoch()).unwrap();
        upsert_task(&conn, &task("done1", 400, TaskKind::SelfReported, Some(-9))).unwrap();
        upsert_task(&conn, &task("open1", 400, TaskKind::SelfReported, Some(-8))).unwrap();
        db::record_completion(&conn, 77, "done1").unwrap();

        // Self-reported tasks never hit the network, so an offline bot is fine.
        let bot = Bot::new("0:offline");
        let eval = evaluate_tasks(&bot, &conn, UserId(77), &["done1", "open1", "ghost"]).await.unwrap();

        assert_eq!(eval.completed.len(), 1);
        assert_eq!(eval.completed[0].id, "done1");
        assert_eq!(eval.remaining.len(), 1);
        assert_eq!(eval.remaining[0].id, "open1");

        // Reward granted exactly once even if the user presses Check again.
        let eval2 = evaluate_tasks(&bot, &conn, UserId(77), &["done1"]).await.unwrap();
        assert_eq!(eval2.completed.len(), 1);
        let user = db::get_user(&conn, 77).unwrap().unwrap();
        assert_eq!(user.amount, 400);
    }
}
