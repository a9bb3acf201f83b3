use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;
use strum::{Display, EnumString};

use crate::core::config::rewards;

/// Per-user conversational state cursor.
///
/// Drives the fallback branch of the text-message handler: `AddingNum` turns
/// the next text into the payout number, `Withdraw` turns it into a requested
/// amount. Stored as TEXT; unknown values read back as `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum UserStatus {
    #[default]
    Idle,
    AddingNum,
    Withdraw,
}

/// How a task is marked completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TaskKind {
    /// Completion is recorded when the user's join request to the task's
    /// channel arrives; the evaluator only reads the record back.
    #[strum(serialize = "self_reported")]
    SelfReported,
    /// Completion is checked live against the task's channel membership when
    /// the user presses Check.
    #[strum(serialize = "membership")]
    Membership,
}

/// A user row.
pub struct User {
    /// Telegram ID of the user
    pub telegram_id: i64,
    /// Display name captured on first /start
    pub user_name: String,
    /// Balance in FCFA
    pub amount: i64,
    /// Number of users who joined through this user's referral link
    pub invited_users: i64,
    /// Payout number, set through the add-number flow
    pub account_number: Option<String>,
    /// Conversational state cursor
    pub status: UserStatus,
    /// Timestamp of the last granted bonus
    pub last_bonus_date: DateTime<Utc>,
    /// Whether the user has ever completed a withdrawal
    pub has_withdrawn: bool,
}

/// A task users can complete once for a one-time reward.
pub struct Task {
    /// Opaque identifier; must not contain '_' (callback-data delimiter)
    pub id: String,
    /// Link shown to the user
    pub link: String,
    /// Reward in FCFA
    pub reward: i64,
    /// Selection priority (higher offered first)
    pub priority: i64,
    /// Completion method
    pub kind: TaskKind,
    /// Channel the task points at, when it is a join-this-channel task
    pub chat_id: Option<i64>,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and ensures the
/// schema exists.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Returns
///
/// Returns a `DbPool` on success or an `r2d2::Error` if pool creation fails.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    // Ensure schema is up to date on first connection
    let conn = pool.get()?;
    if let Err(e) = migrate_schema(&conn) {
        log::warn!("Failed to migrate schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Create all tables if they are missing. Safe to run on every startup.
fn migrate_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            user_name TEXT NOT NULL DEFAULT '',
            amount INTEGER NOT NULL DEFAULT 0,
            invited_users INTEGER NOT NULL DEFAULT 0,
            account_number TEXT,
            status TEXT NOT NULL DEFAULT 'Idle',
            last_bonus_date TEXT NOT NULL,
            has_withdrawn INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            link TEXT NOT NULL,
            reward INTEGER NOT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            kind TEXT NOT NULL,
            chat_id INTEGER
        );
        CREATE TABLE IF NOT EXISTS user_tasks (
            user_id INTEGER NOT NULL,
            task_id TEXT NOT NULL,
            rewarded INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, task_id)
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_chat_id ON tasks(chat_id);",
    )
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User> {
    let status: String = row.get(5)?;
    let last_bonus_date: String = row.get(6)?;
    Ok(User {
        telegram_id: row.get(0)?,
        user_name: row.get(1)?,
        amount: row.get(2)?,
        invited_users: row.get(3)?,
        account_number: row.get(4)?,
        status: status.parse().unwrap_or_default(),
        last_bonus_date: DateTime::parse_from_rfc3339(&last_bonus_date)
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or_else(|_| rewards::bonus_epoch()),
        has_withdrawn: row.get::<_, i64>(7)? != 0,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> Result<Task> {
    let kind: String = row.get(4)?;
    let kind = kind.parse::<TaskKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Task {
        id: row.get(0)?,
        link: row.get(1)?,
        reward: row.get(2)?,
        priority: row.get(3)?,
        kind,
        chat_id: row.get(5)?,
    })
}

const USER_COLUMNS: &str =
    "telegram_id, user_name, amount, invited_users, account_number, status, last_bonus_date, has_withdrawn";

const TASK_COLUMNS: &str = "id, link, reward, priority, kind, chat_id";

/// Creates a new user row.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `telegram_id` - Telegram ID of the user
/// * `user_name` - Display name captured from the profile
/// * `last_bonus_date` - Initial bonus timestamp (the sentinel epoch for new users)
///
/// # Errors
///
/// Returns an error if a row with this ID already exists or on a database failure.
pub fn create_user(
    conn: &DbConnection,
    telegram_id: i64,
    user_name: &str,
    last_bonus_date: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, user_name, last_bonus_date) VALUES (?1, ?2, ?3)",
        &[
            &telegram_id as &dyn rusqlite::ToSql,
            &user_name as &dyn rusqlite::ToSql,
            &last_bonus_date.to_rfc3339() as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Fetches a user by Telegram ID.
///
/// Returns `Ok(Some(User))` when found, `Ok(None)` when absent.
pub fn get_user(conn: &DbConnection, telegram_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE telegram_id = ?", USER_COLUMNS))?;
    let mut rows = stmt.query(&[&telegram_id as &dyn rusqlite::ToSql])?;

    if let Some(row) = rows.next()? {
        Ok(Some(user_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// Updates the conversational status of a user.
pub fn set_status(conn: &DbConnection, telegram_id: i64, status: UserStatus) -> Result<()> {
    conn.execute(
        "UPDATE users SET status = ?1 WHERE telegram_id = ?2",
        &[
            &status.to_string() as &dyn rusqlite::ToSql,
            &telegram_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Stores the payout number entered by the user and resets the status cursor.
pub fn set_account_number(conn: &DbConnection, telegram_id: i64, account_number: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET account_number = ?1, status = ?2 WHERE telegram_id = ?3",
        &[
            &account_number as &dyn rusqlite::ToSql,
            &UserStatus::Idle.to_string() as &dyn rusqlite::ToSql,
            &telegram_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Credits a successful referral to the inviter in one atomic statement.
///
/// Increments `invited_users` by one and `amount` by `reward`. Returns the
/// inviter's display name, or `None` when no row matches the given ID (an
/// unknown inviter is the caller's no-op case, not an error).
pub fn credit_referral(conn: &DbConnection, inviter_id: i64, reward: i64) -> Result<Option<String>> {
    let changed = conn.execute(
        "UPDATE users SET invited_users = invited_users + 1, amount = amount + ?1 WHERE telegram_id = ?2",
        &[&reward as &dyn rusqlite::ToSql, &inviter_id as &dyn rusqlite::ToSql],
    )?;

    if changed == 0 {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT user_name FROM users WHERE telegram_id = ?")?;
    let mut rows = stmt.query(&[&inviter_id as &dyn rusqlite::ToSql])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

/// Grants a bonus and stamps the claim time in one statement.
pub fn grant_bonus(conn: &DbConnection, telegram_id: i64, reward: i64, claimed_at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE users SET amount = amount + ?1, last_bonus_date = ?2 WHERE telegram_id = ?3",
        &[
            &reward as &dyn rusqlite::ToSql,
            &claimed_at.to_rfc3339() as &dyn rusqlite::ToSql,
            &telegram_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Commits a withdrawal with a conditional atomic decrement.
///
/// The balance is only deducted when it still covers the requested amount, so
/// two racing withdrawal messages cannot both pass the check. On success the
/// row also gets `has_withdrawn = 1` and the status cursor returns to Idle.
///
/// # Returns
///
/// `Ok(true)` when the withdrawal was committed, `Ok(false)` when the balance
/// no longer covers the amount.
pub fn try_withdraw(conn: &DbConnection, telegram_id: i64, amount: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET amount = amount - ?1, has_withdrawn = 1, status = ?2
         WHERE telegram_id = ?3 AND amount >= ?1",
        &[
            &amount as &dyn rusqlite::ToSql,
            &UserStatus::Idle.to_string() as &dyn rusqlite::ToSql,
            &telegram_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(changed == 1)
}

/// Counts how many tasks the user has completed.
pub fn completed_task_count(conn: &DbConnection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM user_tasks WHERE user_id = ?",
        &[&user_id as &dyn rusqlite::ToSql],
        |row| row.get(0),
    )
}

/// Lists tasks the user has not completed yet, highest priority first.
pub fn available_tasks(conn: &DbConnection, user_id: i64, limit: usize) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks
         WHERE id NOT IN (SELECT task_id FROM user_tasks WHERE user_id = ?1)
         ORDER BY priority DESC
         LIMIT ?2",
        TASK_COLUMNS
    ))?;
    let limit = limit as i64;
    let mut rows = stmt.query(&[&user_id as &dyn rusqlite::ToSql, &limit as &dyn rusqlite::ToSql])?;

    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(task_from_row(row)?);
    }
    Ok(tasks)
}

/// Fetches a task by identifier.
pub fn get_task(conn: &DbConnection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))?;
    let mut rows = stmt.query(&[&task_id as &dyn rusqlite::ToSql])?;

    if let Some(row) = rows.next()? {
        Ok(Some(task_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// Finds the first task bound to the given chat, if any.
pub fn find_task_by_chat(conn: &DbConnection, chat_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE chat_id = ? LIMIT 1", TASK_COLUMNS))?;
    let mut rows = stmt.query(&[&chat_id as &dyn rusqlite::ToSql])?;

    if let Some(row) = rows.next()? {
        Ok(Some(task_from_row(row)?))
    } else {
        Ok(None)
    }
}

/// Checks whether a completion record exists for (user, task).
pub fn has_completed(conn: &DbConnection, user_id: i64, task_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_tasks WHERE user_id = ?1 AND task_id = ?2",
        &[&user_id as &dyn rusqlite::ToSql, &task_id as &dyn rusqlite::ToSql],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Records a task completion.
///
/// The (user, task) pair is the primary key, so a duplicate insert is a
/// silent no-op. Returns whether a new record was created.
pub fn record_completion(conn: &DbConnection, user_id: i64, task_id: &str) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO user_tasks (user_id, task_id) VALUES (?1, ?2)",
        &[&user_id as &dyn rusqlite::ToSql, &task_id as &dyn rusqlite::ToSql],
    )?;
    Ok(changed == 1)
}

/// Grants the reward for a completed task at most once.
///
/// The grant is gated on atomically flipping the completion record's
/// `rewarded` flag; only the statement that wins the flip credits the
/// balance. Re-running the evaluator over an already-rewarded task is
/// therefore a no-op.
///
/// # Returns
///
/// `Ok(true)` when the reward was credited by this call.
pub fn claim_task_reward(conn: &DbConnection, user_id: i64, task_id: &str, reward: i64) -> Result<bool> {
    let flipped = conn.execute(
        "UPDATE user_tasks SET rewarded = 1 WHERE user_id = ?1 AND task_id = ?2 AND rewarded = 0",
        &[&user_id as &dyn rusqlite::ToSql, &task_id as &dyn rusqlite::ToSql],
    )?;

    if flipped == 0 {
        return Ok(false);
    }

    conn.execute(
        "UPDATE users SET amount = amount + ?1 WHERE telegram_id = ?2",
        &[&reward as &dyn rusqlite::ToSql, &user_id as &dyn rusqlite::ToSql],
    )?;
    Ok(true)
}

/// Inserts or replaces a task definition (operator CLI).
pub fn upsert_task(conn: &DbConnection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO tasks (id, link, reward, priority, kind, chat_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        &[
            &task.id as &dyn rusqlite::ToSql,
            &task.link as &dyn rusqlite::ToSql,
            &task.reward as &dyn rusqlite::ToSql,
            &task.priority as &dyn rusqlite::ToSql,
            &task.kind.to_string() as &dyn rusqlite::ToSql,
            &task.chat_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Lists all task definitions, highest priority first (operator CLI).
pub fn list_tasks(conn: &DbConnection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks ORDER BY priority DESC", TASK_COLUMNS))?;
    let mut rows = stmt.query([])?;

    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(task_from_row(row)?);
    }
    Ok(tasks)
}
