use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use cagnotte::cli::{Cli, Commands};
use cagnotte::core::{config, init_logger};
use cagnotte::storage::db::{self, Task, TaskKind};
use cagnotte::storage::{create_pool, get_connection};
use cagnotte::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::AddTask {
            id,
            link,
            reward,
            priority,
            membership,
            chat_id,
        }) => run_add_task(id, link, reward, priority, membership, chat_id),
        Some(Commands::ListTasks) => run_list_tasks(),
        None => {
            // No command specified - default to running the bot
            log::info!("No command specified, running bot in long polling mode");
            run_bot(false).await
        }
    }
}

/// Run the bot in long-polling or webhook mode.
async fn run_bot(use_webhook: bool) -> Result<()> {
    // Create database connection pool
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );
    log::info!("Database ready at {}", *config::DATABASE_PATH);

    let bot = create_bot()?;

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();
    log::info!("Authorized as @{}", bot_username.as_deref().unwrap_or("<unknown>"));

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    log::info!(
        "Required channels: {:?}, ops chat: {}",
        *config::channels::REQUIRED,
        *config::ops::CHAT_ID
    );

    // Create handler dependencies and the dispatcher tree
    let deps = HandlerDeps::new(Arc::clone(&db_pool), bot_username);
    let handler = schema(deps);

    if use_webhook {
        use teloxide::update_listeners::webhooks;

        let url = config::WEBHOOK_URL
            .clone()
            .ok_or_else(|| anyhow::anyhow!("WEBHOOK_URL must be set for webhook mode"))?;
        let port = *config::WEBHOOK_PORT;
        let addr = ([0, 0, 0, 0], port).into();

        log::info!("Starting bot in webhook mode at {} (port {})", url, port);
        let listener = webhooks::axum(bot.clone(), webhooks::Options::new(addr, url::Url::parse(&url)?)).await?;

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![])
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        use teloxide::update_listeners::Polling;

        log::info!("Starting bot in long polling mode");
        log::info!("📡 Ready to receive updates!");

        // Create polling listener that drops pending updates on start
        let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![])
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    }

    Ok(())
}

/// Insert or update a task definition (operator CLI).
fn run_add_task(id: String, link: String, reward: i64, priority: i64, membership: bool, chat_id: Option<i64>) -> Result<()> {
    if id.contains('_') {
        return Err(anyhow::anyhow!("task ids must not contain '_' (callback-data delimiter)"));
    }
    let kind = if membership { TaskKind::Membership } else { TaskKind::SelfReported };
    if membership && chat_id.is_none() {
        return Err(anyhow::anyhow!("--membership tasks need --chat-id"));
    }

    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let conn = get_connection(&pool)?;
    db::upsert_task(
        &conn,
        &Task {
            id: id.clone(),
            link,
            reward,
            priority,
            kind,
            chat_id,
        },
    )?;

    println!("Task '{}' saved ({}, reward {} FCFA)", id, kind, reward);
    Ok(())
}

/// Print the configured tasks (operator CLI).
fn run_list_tasks() -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let conn = get_connection(&pool)?;

    let tasks = db::list_tasks(&conn)?;
    if tasks.is_empty() {
        println!("No tasks configured.");
        return Ok(());
    }

    for task in tasks {
        println!(
            "{}  kind={}  reward={} FCFA  priority={}  chat_id={}  {}",
            task.id,
            task.kind,
            task.reward,
            task.priority,
            task.chat_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            task.link,
        );
    }
    Ok(())
}
