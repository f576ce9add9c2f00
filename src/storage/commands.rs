use rusqlite::{params, Result};

use crate::storage::db::{now_timestamp, DbConnection};

/// Usage count of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCount {
    pub command: String,
    pub count: i64,
}

/// Appends one command invocation for `user_id` (internal id).
pub fn record_command(conn: &DbConnection, user_id: i64, command: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO command_stats (user_id, command, executed_at) VALUES (?1, ?2, ?3)",
        params![user_id, command, now_timestamp()],
    )?;
    Ok(())
}

/// Commands executed by one user.
pub fn count_for_user(conn: &DbConnection, user_id: i64) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM command_stats WHERE user_id = ?1", [user_id], |row| {
        row.get(0)
    })
}

/// Commands executed by all users.
pub fn count_total(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM command_stats", [], |row| row.get(0))
}

/// Most used commands, most frequent first; ties ordered by command name.
pub fn top_commands(conn: &DbConnection, limit: usize) -> Result<Vec<CommandCount>> {
    let mut stmt = conn.prepare(
        "SELECT command, COUNT(*) AS cnt FROM command_stats
         GROUP BY command
         ORDER BY cnt DESC, command ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], |row| {
        Ok(CommandCount {
            command: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    rows.collect()
}
