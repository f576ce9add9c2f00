use rusqlite::{params, OptionalExtension, Result, Row};

use crate::storage::db::{now_timestamp, DbConnection};

/// A user as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal id, stable across upserts
    pub id: i64,
    pub telegram_user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// The mutable identity fields reported by Telegram on every interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub telegram_user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        telegram_user_id: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        language_code: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Creates the user or refreshes its profile fields, keyed on the Telegram id.
///
/// The internal id and `created_at` never change after the first insert.
pub fn upsert_user(conn: &DbConnection, profile: &UserProfile) -> Result<User> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO users (telegram_user_id, username, first_name, last_name, language_code, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(telegram_user_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            language_code = excluded.language_code,
            updated_at = excluded.updated_at",
        params![
            profile.telegram_user_id,
            profile.username,
            profile.first_name,
            profile.last_name,
            profile.language_code,
            now,
        ],
    )?;

    get_by_telegram_id(conn, profile.telegram_user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Looks a user up by Telegram id.
pub fn get_by_telegram_id(conn: &DbConnection, telegram_user_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, telegram_user_id, username, first_name, last_name, language_code, created_at, updated_at
         FROM users WHERE telegram_user_id = ?1",
        [telegram_user_id],
        user_from_row,
    )
    .optional()
}

/// Total number of known users.
pub fn count_users(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
